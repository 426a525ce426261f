//! JSON-lines telemetry replay.
//!
//! One record per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"glucose","samples":[{"startDate":"...","mgDl":120.0,"trend":"flat"}]}
//! {"kind":"dosingDecision","date":"...","insulinOnBoard":1.2,"historicalGlucose":[...]}
//! {"kind":"inbound","payload":"status","app":"watchface"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use lw_app::WatchSyncService;
use lw_core::{CompanionApp, CompanionAppKind, DosingDecision, GlucoseSample};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReplayRecord {
    /// Samples newest first, as handed to the glucose upload.
    Glucose { samples: Vec<GlucoseSample> },
    DosingDecision(DosingDecision),
    /// An app message from the first paired device.
    Inbound {
        payload: Value,
        #[serde(default = "default_app")]
        app: CompanionAppKind,
    },
}

fn default_app() -> CompanionAppKind {
    CompanionAppKind::Watchface
}

/// Counts of what a replay did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub glucose_batches: usize,
    pub dosing_decisions: usize,
    pub inbound_messages: usize,
    pub skipped: usize,
}

pub fn parse_records(reader: impl BufRead) -> anyhow::Result<Vec<ReplayRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(line)
            .with_context(|| format!("Invalid replay record on line {line_no}"))?;
        records.push(record);
    }
    Ok(records)
}

/// Feed `records` through the service in order.
pub async fn replay(service: &WatchSyncService, records: &[ReplayRecord]) -> ReplaySummary {
    let mut summary = ReplaySummary::default();

    for record in records {
        match record {
            ReplayRecord::Glucose { samples } => {
                if service.upload_glucose_data(samples).await {
                    summary.glucose_batches += 1;
                } else {
                    summary.skipped += 1;
                }
            }
            ReplayRecord::DosingDecision(decision) => {
                service
                    .upload_dosing_decision_data(std::slice::from_ref(decision))
                    .await;
                summary.dosing_decisions += 1;
            }
            ReplayRecord::Inbound { payload, app } => {
                let Some(device) = service.list_devices().await.into_iter().next() else {
                    warn!("Inbound record skipped, no paired device");
                    summary.skipped += 1;
                    continue;
                };
                let outcome = service
                    .handle_app_message(payload, &CompanionApp::new(*app, device))
                    .await;
                debug!(?outcome, "Inbound record handled");
                summary.inbound_messages += 1;
            }
        }
    }

    summary
}
