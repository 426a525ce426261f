//! Telemetry records fed into the watch state.
//!
//! All glucose quantities are milligrams per decilitre; insulin is in units
//! and carbohydrates in grams.

mod trend;

pub use trend::GlucoseTrend;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A direct glucose measurement from the sample stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlucoseSample {
    pub start_date: DateTime<Utc>,
    pub mg_dl: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<GlucoseTrend>,
}

impl GlucoseSample {
    pub fn new(start_date: DateTime<Utc>, mg_dl: f64, trend: Option<GlucoseTrend>) -> Self {
        Self {
            start_date,
            mg_dl,
            trend,
        }
    }
}

/// A timestamped glucose value without trend (predicted series).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlucoseValue {
    pub start_date: DateTime<Utc>,
    pub mg_dl: f64,
}

/// The loop's dosing decision for one cycle.
///
/// `historical_glucose` and `predicted_glucose` are ordered oldest first, so
/// the most recent historical sample is the last element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DosingDecision {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub insulin_on_board: Option<f64>,
    #[serde(default)]
    pub carbs_on_board: Option<f64>,
    #[serde(default)]
    pub historical_glucose: Vec<GlucoseSample>,
    #[serde(default)]
    pub predicted_glucose: Vec<GlucoseValue>,
    #[serde(default)]
    pub bolus_after_carbs: Option<bool>,
}

impl DosingDecision {
    pub fn new(date: DateTime<Utc>) -> Self {
        Self {
            date,
            insulin_on_board: None,
            carbs_on_board: None,
            historical_glucose: Vec::new(),
            predicted_glucose: Vec::new(),
            bolus_after_carbs: None,
        }
    }

    pub fn latest_historical_glucose(&self) -> Option<&GlucoseSample> {
        self.historical_glucose.last()
    }

    pub fn eventual_glucose(&self) -> Option<&GlucoseValue> {
        self.predicted_glucose.last()
    }
}
