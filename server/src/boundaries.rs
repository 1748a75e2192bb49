//! Camp outlines, converted from Esri JSON to GeoJSON on load.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};
use shared::models::LngLat;
use std::path::Path;

use crate::error::{Error, Result};

/// Property holding the camp name, as in the survey tables.
pub const CAMP_NAME_KEY: &str = "CampName";

type Ring = Vec<Vec<f64>>;

#[derive(Debug, Deserialize)]
pub struct EsriFeatureSet {
    pub features: Vec<EsriFeature>,
}

#[derive(Debug, Deserialize)]
pub struct EsriFeature {
    #[serde(default)]
    pub attributes: JsonObject,
    pub geometry: EsriPolygon,
}

#[derive(Debug, Deserialize)]
pub struct EsriPolygon {
    pub rings: Vec<Ring>,
}

/// Rings become a polygon and `attributes` become `properties`.
///
/// Esri exterior rings run clockwise and holes counter-clockwise; each
/// clockwise ring opens a new polygon, so several exteriors give a
/// `MultiPolygon`.
pub fn normalize_boundary(feature: EsriFeature) -> Feature {
    let mut polygons: Vec<Vec<Ring>> = Vec::new();
    for ring in feature.geometry.rings {
        match polygons.last_mut() {
            Some(polygon) if !is_clockwise(&ring) => polygon.push(ring),
            _ => polygons.push(vec![ring]),
        }
    }

    let geometry = match polygons.len() {
        0 => None,
        1 => polygons.pop().map(|p| Geometry::new(Value::Polygon(p))),
        _ => Some(Geometry::new(Value::MultiPolygon(polygons))),
    };

    Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(feature.attributes),
        foreign_members: None,
    }
}

/// Shoelace sum; negative for clockwise rings in lng/lat order.
fn is_clockwise(ring: &[Vec<f64>]) -> bool {
    let area: f64 = ring
        .windows(2)
        .filter(|w| w[0].len() >= 2 && w[1].len() >= 2)
        .map(|w| w[0][0] * w[1][1] - w[1][0] * w[0][1])
        .sum();
    area < 0.0
}

pub fn camp_name(feature: &Feature) -> Option<&str> {
    feature
        .properties
        .as_ref()?
        .get(CAMP_NAME_KEY)?
        .as_str()
}

/// Midpoint of the bounding box of the feature's first ring.
pub fn first_ring_centre(feature: &Feature) -> Option<LngLat> {
    let ring = match &feature.geometry.as_ref()?.value {
        Value::Polygon(rings) => rings.first()?,
        Value::MultiPolygon(polygons) => polygons.first()?.first()?,
        _ => return None,
    };
    let points: Vec<LngLat> = ring
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| LngLat::new(p[0], p[1]))
        .collect();
    LngLat::bbox_centre(&points)
}

#[derive(Clone, Debug, Default)]
pub struct Boundaries {
    features: Vec<Feature>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BoundaryView {
    pub collection: FeatureCollection,
    pub centre: Option<LngLat>,
}

impl Boundaries {
    /// Load an Esri feature set; a missing file yields no boundaries.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No camp boundaries at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(Error::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let set: EsriFeatureSet = serde_json::from_str(content)?;
        let features: Vec<Feature> = set.features.into_iter().map(normalize_boundary).collect();
        log::debug!("Loaded {} camp boundaries", features.len());
        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn for_camp(&self, camp: &str) -> Vec<&Feature> {
        self.features
            .iter()
            .filter(|f| camp_name(f) == Some(camp))
            .collect()
    }

    /// The camp's features and map centre; `None` when it has no outline.
    pub fn view(&self, camp: &str) -> Option<BoundaryView> {
        let features: Vec<Feature> = self.for_camp(camp).into_iter().cloned().collect();
        let centre = first_ring_centre(features.first()?);
        Some(BoundaryView {
            collection: collection(features),
            centre,
        })
    }

    pub fn collection(&self) -> FeatureCollection {
        collection(self.features.clone())
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // clockwise square around (92.15, 21.2) with a counter-clockwise hole
    const OUTLINE: &str = r#"{
        "displayFieldName": "CampName",
        "features": [
            {
                "attributes": {"OBJECTID": 1, "CampName": "Camp 1E"},
                "geometry": {"rings": [
                    [[92.1, 21.1], [92.1, 21.3], [92.2, 21.3], [92.2, 21.1], [92.1, 21.1]],
                    [[92.14, 21.19], [92.16, 21.19], [92.16, 21.21], [92.14, 21.21], [92.14, 21.19]]
                ]}
            },
            {
                "attributes": {"OBJECTID": 2, "CampName": "Camp 2W"},
                "geometry": {"rings": [
                    [[92.0, 21.0], [92.0, 21.05], [92.05, 21.05], [92.05, 21.0], [92.0, 21.0]],
                    [[92.3, 21.0], [92.3, 21.1], [92.4, 21.1], [92.4, 21.0], [92.3, 21.0]]
                ]}
            }
        ]
    }"#;

    #[test]
    fn test_polygon_with_hole() {
        let boundaries = Boundaries::parse(OUTLINE).unwrap();
        let feature = boundaries.for_camp("Camp 1E")[0];
        match &feature.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => assert_eq!(rings.len(), 2),
            other => panic!("expected a polygon, got {:?}", other),
        }
        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["OBJECTID"], serde_json::json!(1));
    }

    #[test]
    fn test_several_exteriors_become_a_multipolygon() {
        let boundaries = Boundaries::parse(OUTLINE).unwrap();
        let feature = boundaries.for_camp("Camp 2W")[0];
        match &feature.geometry.as_ref().unwrap().value {
            Value::MultiPolygon(polygons) => assert_eq!(polygons.len(), 2),
            other => panic!("expected a multipolygon, got {:?}", other),
        }
    }

    #[test]
    fn test_camp_view_centre() {
        let boundaries = Boundaries::parse(OUTLINE).unwrap();
        let view = boundaries.view("Camp 1E").unwrap();
        assert_eq!(view.collection.features.len(), 1);
        let centre = view.centre.unwrap();
        assert!((centre.lng - 92.15).abs() < 1e-9);
        assert!((centre.lat - 21.2).abs() < 1e-9);

        assert!(boundaries.view("Camp 99").is_none());
    }

    #[test]
    fn test_serialized_as_geojson() {
        let boundaries = Boundaries::parse(OUTLINE).unwrap();
        let json = serde_json::to_value(boundaries.collection()).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["properties"]["CampName"], "Camp 1E");
        assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
    }

    #[test]
    fn test_missing_file_means_no_boundaries() {
        let boundaries = Boundaries::load(Path::new("does/not/exist.json")).unwrap();
        assert!(boundaries.is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline.json");
        std::fs::write(&path, "{\"features\": [{\"attributes\": {}}]}").unwrap();
        assert!(matches!(Boundaries::load(&path), Err(Error::Json(_))));
    }
}
