//! Fire susceptibility, weather and risk indices and their severity classes.
//!
//! Everything here is pure. Values stay at full precision; rounding happens
//! only at display time through [`headline`] and [`display`].

use serde::Serialize;
use std::fmt;

use crate::models::WeatherRecord;

/// Fire Weather Index: `0.5·T + 0.1·RH + 0.3·W − 0.2·P`.
///
/// Not clamped: extreme inputs can go below 0 or above 100.
pub fn fwi(w: &WeatherRecord) -> f64 {
    0.5 * w.temp + 0.1 * w.relative_humidity + 0.3 * w.wind_speed - 0.2 * w.precipitation
}

/// Fire Susceptibility Index: mean of the four sub-scores.
///
/// Missing sub-scores count as 0 and the denominator is always 4.
pub fn fsi(
    environment: Option<f64>,
    fuel: Option<f64>,
    behaviour: Option<f64>,
    response: Option<f64>,
) -> f64 {
    [environment, fuel, behaviour, response]
        .iter()
        .map(|v| v.unwrap_or(0.0))
        .sum::<f64>()
        / 4.0
}

/// Fire Risk Index: FSI scaled up by the current FWI.
pub fn fri(fsi: f64, fwi: f64) -> f64 {
    fsi * (1.0 + fwi / 100.0)
}

/// Headline value shown on the index cards.
pub fn headline(value: f64) -> i64 {
    value.ceil() as i64
}

/// Value shown in tables and charts: nearest integer, ties to even.
pub fn display(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Upper edge of a severity band.
#[derive(Clone, Copy, Debug)]
pub enum Upper {
    Below(f64),
    AtMost(f64),
}

impl Upper {
    fn admits(self, value: f64) -> bool {
        match self {
            Upper::Below(limit) => value < limit,
            Upper::AtMost(limit) => value <= limit,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Band<C> {
    pub upper: Upper,
    pub class: C,
}

/// Ascending bands; a value takes the class of the first band admitting it,
/// or `top` when none does (including NaN).
#[derive(Clone, Copy, Debug)]
pub struct Scale<C: 'static> {
    pub bands: &'static [Band<C>],
    pub top: C,
}

impl<C: Copy> Scale<C> {
    pub fn classify(&self, value: f64) -> C {
        self.bands
            .iter()
            .find(|band| band.upper.admits(value))
            .map(|band| band.class)
            .unwrap_or(self.top)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FsiClass {
    Moderate,
    High,
    Urgent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FwiClass {
    #[serde(rename = "Low fire danger")]
    Low,
    #[serde(rename = "Moderate fire danger")]
    Moderate,
    #[serde(rename = "Severe fire danger")]
    Severe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FriClass {
    #[serde(rename = "Low risk")]
    Low,
    #[serde(rename = "Moderate risk")]
    Moderate,
    #[serde(rename = "High risk")]
    High,
    #[serde(rename = "Extreme risk")]
    Extreme,
}

pub const FSI_SCALE: Scale<FsiClass> = Scale {
    bands: &[
        Band {
            upper: Upper::Below(33.0),
            class: FsiClass::Moderate,
        },
        Band {
            upper: Upper::Below(67.0),
            class: FsiClass::High,
        },
    ],
    top: FsiClass::Urgent,
};

pub const FWI_SCALE: Scale<FwiClass> = Scale {
    bands: &[
        Band {
            upper: Upper::AtMost(20.0),
            class: FwiClass::Low,
        },
        Band {
            upper: Upper::AtMost(30.0),
            class: FwiClass::Moderate,
        },
    ],
    top: FwiClass::Severe,
};

pub const FRI_SCALE: Scale<FriClass> = Scale {
    bands: &[
        Band {
            upper: Upper::Below(50.0),
            class: FriClass::Low,
        },
        Band {
            upper: Upper::Below(75.0),
            class: FriClass::Moderate,
        },
        Band {
            upper: Upper::Below(100.0),
            class: FriClass::High,
        },
    ],
    top: FriClass::Extreme,
};

pub fn classify_fsi(value: f64) -> FsiClass {
    FSI_SCALE.classify(value)
}

pub fn classify_fwi(value: f64) -> FwiClass {
    FWI_SCALE.classify(value)
}

pub fn classify_fri(value: f64) -> FriClass {
    FRI_SCALE.classify(value)
}

impl FsiClass {
    pub fn label(&self) -> &'static str {
        match self {
            FsiClass::Moderate => "Moderate",
            FsiClass::High => "High",
            FsiClass::Urgent => "Urgent",
        }
    }
}

impl FwiClass {
    pub fn label(&self) -> &'static str {
        match self {
            FwiClass::Low => "Low fire danger",
            FwiClass::Moderate => "Moderate fire danger",
            FwiClass::Severe => "Severe fire danger",
        }
    }

    pub fn short_label(&self) -> &'static str {
        first_word(self.label())
    }

    /// Group name used by the FWI narrative.
    pub fn narrative_group(&self) -> &'static str {
        match self {
            FwiClass::Low => "Low",
            FwiClass::Moderate => "Moderate to high",
            FwiClass::Severe => "Severe",
        }
    }
}

impl FriClass {
    pub fn label(&self) -> &'static str {
        match self {
            FriClass::Low => "Low risk",
            FriClass::Moderate => "Moderate risk",
            FriClass::High => "High risk",
            FriClass::Extreme => "Extreme risk",
        }
    }

    pub fn short_label(&self) -> &'static str {
        first_word(self.label())
    }

    pub fn color(&self) -> &'static str {
        match self {
            FriClass::Low => "green",
            FriClass::Moderate => "orange",
            FriClass::High => "red",
            FriClass::Extreme => "darkred",
        }
    }
}

fn first_word(label: &'static str) -> &'static str {
    label.split_whitespace().next().unwrap_or(label)
}

impl fmt::Display for FsiClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for FwiClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for FriClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
