//! Merges the glucose-sample stream and the dosing-decision stream into the
//! single long-lived `WatchState`, then hands a copy to the publisher.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info_span, Instrument};

use lw_core::{DosingDecision, GlucoseMerge, GlucoseSample, WatchState};

use super::inbound_event_bridge::SnapshotProvider;
use super::throttled_publisher::ThrottledPublisher;

pub struct StateAggregator {
    state: Mutex<WatchState>,
    publisher: Arc<ThrottledPublisher>,
}

impl StateAggregator {
    pub fn new(publisher: Arc<ThrottledPublisher>) -> Self {
        Self {
            state: Mutex::new(WatchState::default()),
            publisher,
        }
    }

    /// Apply a batch of direct glucose samples, newest first.
    ///
    /// Returns `false` (and pushes nothing) for an empty batch.
    pub async fn apply_glucose_samples(&self, samples: &[GlucoseSample]) -> bool {
        let span = info_span!("usecase.state_aggregator.glucose", sample_count = samples.len());

        async {
            let mut state = self.state.lock().await;
            if !state.apply_glucose_samples(samples) {
                debug!("Empty glucose batch ignored");
                return false;
            }
            debug!(glucose = ?state.glucose, delta = ?state.delta, "Glucose updated from samples");
            self.publisher.push(state.clone());
            true
        }
        .instrument(span)
        .await
    }

    /// Apply one dosing decision.
    pub async fn apply_dosing_decision(&self, decision: &DosingDecision) -> GlucoseMerge {
        let span = info_span!(
            "usecase.state_aggregator.dosing_decision",
            history_len = decision.historical_glucose.len()
        );

        async {
            let mut state = self.state.lock().await;
            let merge = state.apply_dosing_decision(decision);
            match merge {
                GlucoseMerge::Overwritten => {
                    debug!(glucose = ?state.glucose, "Glucose updated from decision history")
                }
                GlucoseMerge::KeptExisting => {
                    debug!("Decision history not newer than current glucose, kept existing")
                }
                GlucoseMerge::NoHistory => debug!("Decision carried no glucose history"),
            }
            self.publisher.push(state.clone());
            merge
        }
        .instrument(span)
        .await
    }

    /// Copy of the current snapshot.
    pub async fn snapshot(&self) -> WatchState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl SnapshotProvider for StateAggregator {
    async fn current_snapshot(&self) -> Option<WatchState> {
        Some(self.snapshot().await)
    }
}
