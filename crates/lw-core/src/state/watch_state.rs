use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format;
use crate::telemetry::{DosingDecision, GlucoseSample, GlucoseTrend};

/// Value sent as `eventualBGRaw` when the decision carries no prediction.
pub const EVENTUAL_GLUCOSE_PLACEHOLDER: &str = "--";

/// Canonical snapshot delivered to the companion apps.
///
/// Field names are the exact wire names. Fields that were never set are
/// omitted from the message.
///
/// 发送给伴随应用的规范快照；字段名即线上字段名，未设置的字段不会序列化。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose_date_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_loop_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_loop_date_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bolus_after_carbs: Option<bool>,
    #[serde(rename = "eventualBGRaw", default, skip_serializing_if = "Option::is_none")]
    pub eventual_bg_raw: Option<String>,
}

/// What happened to the glucose fields when a dosing decision was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlucoseMerge {
    /// The decision's newest historical sample replaced the current glucose.
    Overwritten,
    /// The snapshot already held a reading at least as recent.
    KeptExisting,
    /// The decision carried no historical glucose.
    NoHistory,
}

impl WatchState {
    /// Apply a batch from the direct sample stream, newest first.
    ///
    /// The newest sample always wins; the delta is taken against the second
    /// sample, or zero when there is only one. Returns `false` for an empty
    /// batch, leaving the snapshot untouched.
    pub fn apply_glucose_samples(&mut self, samples: &[GlucoseSample]) -> bool {
        let Some(current) = samples.first() else {
            return false;
        };

        let delta = samples
            .get(1)
            .map(|previous| current.mg_dl - previous.mg_dl)
            .unwrap_or(0.0);

        self.glucose = Some(format::glucose(current.mg_dl));
        self.delta = Some(format::delta(delta));
        self.set_trend(current.trend);
        self.set_glucose_date(current.start_date);
        true
    }

    /// Apply a dosing decision.
    ///
    /// Insulin, carbs, eventual glucose and loop date always follow the
    /// decision. Glucose (and trend when the sample has one) is replaced only
    /// when the decision's newest historical sample is strictly newer than
    /// the snapshot's glucose date, or the snapshot has no glucose date yet.
    pub fn apply_dosing_decision(&mut self, decision: &DosingDecision) -> GlucoseMerge {
        self.iob = Some(decision.insulin_on_board.unwrap_or(0.0));
        self.cob = Some(decision.carbs_on_board.unwrap_or(0.0));
        if decision.bolus_after_carbs.is_some() {
            self.bolus_after_carbs = decision.bolus_after_carbs;
        }

        self.eventual_bg_raw = Some(match decision.eventual_glucose() {
            Some(eventual) => format::eventual_glucose(eventual.mg_dl),
            None => EVENTUAL_GLUCOSE_PLACEHOLDER.to_string(),
        });

        self.last_loop_date = Some(decision.date);
        self.last_loop_date_interval = Some(epoch_seconds(decision.date));

        let Some(latest) = decision.latest_historical_glucose() else {
            return GlucoseMerge::NoHistory;
        };

        let is_fresher = match self.glucose_date {
            Some(existing) => existing < latest.start_date,
            None => true,
        };
        if !is_fresher {
            return GlucoseMerge::KeptExisting;
        }

        self.glucose = Some(format::glucose(latest.mg_dl));
        self.set_glucose_date(latest.start_date);
        if latest.trend.is_some() {
            self.set_trend(latest.trend);
        }

        let history = &decision.historical_glucose;
        if history.len() >= 3 {
            let reference = &history[history.len() - 3];
            self.delta = Some(format::delta(latest.mg_dl - reference.mg_dl));
        }

        GlucoseMerge::Overwritten
    }

    fn set_trend(&mut self, trend: Option<GlucoseTrend>) {
        self.trend = Some(trend.map(|t| t.symbol()).unwrap_or_default().to_string());
        self.trend_raw = Some(trend.map(|t| t.raw_value()).unwrap_or(0).to_string());
    }

    fn set_glucose_date(&mut self, date: DateTime<Utc>) {
        self.glucose_date = Some(date);
        self.glucose_date_interval = Some(epoch_seconds(date));
    }
}

fn epoch_seconds(date: DateTime<Utc>) -> u64 {
    u64::try_from(date.timestamp()).unwrap_or(0)
}
