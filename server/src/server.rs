use serde::Serialize;
use std::convert::Infallible;
use std::str::FromStr;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use shared::messages::{NoData, TimeWindow};

use crate::dashboard::{self, Dashboard};

pub async fn run(address: std::net::SocketAddr, dashboard: Dashboard) {
    log::info!("Serving fire risk dashboard on http://{}", address);

    let routes = routes(dashboard)
        .with(warp::compression::gzip())
        .with(warp::log("firerisk::http"));

    warp::serve(routes).run(address).await
}

pub fn routes(
    dashboard: Dashboard,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health_route = warp::path!("health").and(warp::get()).map(|| StatusCode::OK);

    let camps_route = warp::path!("camps")
        .and(warp::get())
        .and(with_dashboard(dashboard.clone()))
        .map(|dashboard: Dashboard| warp::reply::json(&dashboard.camps()));

    let overview_route = warp::path!("overview")
        .and(warp::get())
        .and(with_dashboard(dashboard.clone()))
        .map(|dashboard: Dashboard| warp::reply::json(&dashboard.overview()));

    let site_route = warp::path!("camps" / CampName)
        .and(warp::get())
        .and(with_dashboard(dashboard.clone()))
        .and_then(site);

    let window_route = warp::path!("camps" / CampName / "fwi" / TimeWindow)
        .and(warp::get())
        .and(with_dashboard(dashboard.clone()))
        .and_then(window);

    let boundary_route = warp::path!("camps" / CampName / "boundary")
        .and(warp::get())
        .and(with_dashboard(dashboard.clone()))
        .map(|camp: CampName, dashboard: Dashboard| {
            respond(dashboard.boundary(&camp.0))
        });

    let boundaries_route = warp::path!("boundaries")
        .and(warp::get())
        .and(with_dashboard(dashboard))
        .map(|dashboard: Dashboard| {
            warp::reply::json(&dashboard.state().boundaries.collection())
        });

    health_route
        .or(camps_route)
        .or(overview_route)
        .or(site_route)
        .or(window_route)
        .or(boundary_route)
        .or(boundaries_route)
        .recover(rejection)
}

fn with_dashboard(
    dashboard: Dashboard,
) -> impl Filter<Extract = (Dashboard,), Error = Infallible> + Clone {
    warp::any().map(move || dashboard.clone())
}

/// Camp name from a path segment, percent-decoded (`Camp%201E`).
pub struct CampName(pub String);

impl FromStr for CampName {
    type Err = ();
    fn from_str(s: &str) -> Result<CampName, ()> {
        urlencoding::decode(s)
            .map(|name| CampName(name.into_owned()))
            .map_err(|_| ())
    }
}

pub async fn site(camp: CampName, dashboard: Dashboard) -> Result<impl Reply, Rejection> {
    let view = dashboard.site(&camp.0, dashboard::today()).await;
    Ok(respond(view))
}

pub async fn window(
    camp: CampName,
    window: TimeWindow,
    dashboard: Dashboard,
) -> Result<impl Reply, Rejection> {
    let view = dashboard.window(&camp.0, window, dashboard::today()).await;
    Ok(respond(view))
}

/// Views as JSON; a missing camp gets its placeholder body with a 404.
fn respond<T: Serialize>(view: Result<T, NoData>) -> warp::reply::WithStatus<warp::reply::Json> {
    match view {
        Ok(view) => warp::reply::with_status(warp::reply::json(&view), StatusCode::OK),
        Err(no_data) => {
            log::debug!("No data for {}: {}", no_data.camp, no_data.message);
            warp::reply::with_status(warp::reply::json(&no_data), StatusCode::NOT_FOUND)
        }
    }
}

#[derive(Serialize)]
struct ErrorMessage {
    code: u16,
    message: String,
}

pub async fn rejection(err: warp::Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found.")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.")
    } else {
        log::error!("Error: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    };

    let json = warp::reply::json(&ErrorMessage {
        code: code.as_u16(),
        message: message.into(),
    });

    Ok(warp::reply::with_status(json, code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundaries::Boundaries;
    use crate::sources::testing::{weather, StubClimatology, StubWeather};
    use crate::sources::MonthlyWeather;
    use crate::state::AppState;
    use shared::models::{BlockRecord, CampSummary, CurrentRisk, LngLat, SurveyScores};
    use std::sync::Arc;

    const OUTLINE: &str = r#"{"features": [{
        "attributes": {"CampName": "Camp 1E"},
        "geometry": {"rings": [[[92.1, 21.1], [92.1, 21.3], [92.2, 21.3], [92.2, 21.1], [92.1, 21.1]]]}
    }]}"#;

    fn dashboard() -> Dashboard {
        let position = LngLat::new(92.15, 21.21);
        let state = AppState {
            camps: vec![CampSummary {
                camp_name: "Camp 1E".to_string(),
                fsi: 60.0,
                position,
                dimensions: SurveyScores::default(),
                current: Some(CurrentRisk::derive(60.0, 21.0)),
            }],
            blocks: vec![BlockRecord {
                camp_name: "Camp 1E".to_string(),
                block: "A1".to_string(),
                scores: SurveyScores {
                    environment: Some(80.0),
                    ..SurveyScores::default()
                },
                position,
            }],
            boundaries: Boundaries::parse(OUTLINE).unwrap(),
            ..AppState::default()
        };
        let months = vec![MonthlyWeather::Proxy(weather(30.0, 50.0, 10.0, 2.0)); 12];
        Dashboard::new(
            Arc::new(state),
            Arc::new(StubWeather::constant(weather(30.0, 40.0, 10.0, 5.0))),
            Arc::new(StubClimatology(months)),
            3,
        )
    }

    async fn get(path: &str) -> (StatusCode, serde_json::Value) {
        let res = warp::test::request()
            .method("GET")
            .path(path)
            .reply(&routes(dashboard()))
            .await;
        let body = serde_json::from_slice(res.body()).unwrap_or(serde_json::Value::Null);
        (res.status(), body)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_camps() {
        let (status, body) = get("/camps").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["camps"], serde_json::json!(["Camp 1E"]));
    }

    #[tokio::test]
    async fn test_overview() {
        let (status, body) = get("/overview").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"][0]["fri"], 73);
        assert_eq!(body["rows"][0]["friClass"], "Moderate risk");
    }

    #[tokio::test]
    async fn test_site_with_encoded_name() {
        let (status, body) = get("/camps/Camp%201E").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["camp"], "Camp 1E");
        assert_eq!(body["fsi"]["value"], 60);
        assert_eq!(body["fwi"]["shortClass"], "Moderate");
        assert_eq!(body["blocks"][0]["fsi"], 20);
    }

    #[tokio::test]
    async fn test_windows() {
        let (status, body) = get("/camps/Camp%201E/fwi/forecasted").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["panel"]["window"], "forecasted");
        assert_eq!(body["panel"]["days"].as_array().map(Vec::len), Some(3));

        let (status, body) = get("/camps/Camp%201E/fwi/monthly").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["panel"]["months"][0]["fri"], 74);

        let (status, body) = get("/camps/Camp%201E/fwi/current").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["panel"]["rank"], 1);
    }

    #[tokio::test]
    async fn test_unknown_window() {
        let (status, body) = get("/camps/Camp%201E/fwi/seasonal").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
    }

    #[tokio::test]
    async fn test_unknown_camp_gets_no_data() {
        let (status, body) = get("/camps/Camp%2099").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["camp"], "Camp 99");
        assert_eq!(body["message"], "No data available");
    }

    #[tokio::test]
    async fn test_boundary() {
        let (status, body) = get("/camps/Camp%201E/boundary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collection"]["type"], "FeatureCollection");
        assert!((body["centre"]["lat"].as_f64().unwrap() - 21.2).abs() < 1e-9);

        let (status, body) = get("/boundaries").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["features"].as_array().map(Vec::len), Some(1));
    }
}
