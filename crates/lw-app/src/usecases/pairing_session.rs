//! Device selection flow.
//!
//! `select_devices` opens the accessory's selection UI and waits for the
//! selection response to come back out of band (deep link). Only one request
//! may be outstanding; it resolves exactly once, either with the parsed
//! devices or, after the deadline, with an empty list.
//!
//! 设备选择流程：同一时间只允许一个未完成的请求，超时后返回空列表。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::{timeout, Instant};
use tracing::{info, info_span, warn, Instrument};

use lw_core::ports::{AccessoryTransportPort, TransportError};
use lw_core::Device;

use super::device_registry::DeviceRegistry;

#[derive(Debug, Error)]
pub enum PairingError {
    /// Another selection request is still waiting for its response.
    #[error("a device selection is already in progress")]
    AlreadyInProgress,

    /// The selection UI could not be opened.
    #[error("failed to open device selection: {0}")]
    Transport(#[from] TransportError),
}

struct PendingSelection {
    id: u64,
    deadline: Instant,
    responder: oneshot::Sender<Vec<Device>>,
}

pub struct PairingSession {
    transport: Arc<dyn AccessoryTransportPort>,
    registry: Arc<DeviceRegistry>,
    timeout: Duration,
    pending: Mutex<Option<PendingSelection>>,
    next_id: AtomicU64,
}

impl PairingSession {
    pub fn new(
        transport: Arc<dyn AccessoryTransportPort>,
        registry: Arc<DeviceRegistry>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            registry,
            timeout,
            pending: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Open the selection UI and wait for the user's choice.
    ///
    /// Resolves with an empty list when no response arrives before the
    /// deadline; callers must read that as "cancelled", not as "zero devices
    /// chosen". Fails with [`PairingError::AlreadyInProgress`] while another
    /// request is outstanding.
    pub async fn select_devices(&self) -> Result<Vec<Device>, PairingError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("usecase.pairing.select_devices", request_id = id);

        async {
            let (responder, response) = oneshot::channel();
            {
                let mut pending = self.lock_pending();
                if pending.as_ref().is_some_and(PendingSelection::is_live) {
                    warn!("Rejected device selection, another one is in progress");
                    return Err(PairingError::AlreadyInProgress);
                }
                *pending = Some(PendingSelection {
                    id,
                    deadline: Instant::now() + self.timeout,
                    responder,
                });
            }

            if let Err(err) = self.transport.show_device_selection().await {
                warn!(error = %err, "Failed to open device selection");
                self.clear_pending(id);
                return Err(err.into());
            }
            info!(timeout_secs = self.timeout.as_secs(), "Waiting for device selection");

            match timeout(self.timeout, response).await {
                Ok(Ok(devices)) => {
                    info!(device_count = devices.len(), "Device selection resolved");
                    Ok(devices)
                }
                Ok(Err(_)) => {
                    warn!("Device selection dropped without a response");
                    Ok(Vec::new())
                }
                Err(_) => {
                    self.clear_pending(id);
                    info!("Device selection timed out");
                    Ok(Vec::new())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Handle a selection response delivered by the host.
    ///
    /// The parsed devices (possibly none) replace the registry, then the
    /// outstanding request, if any, is resolved and cleared.
    pub async fn handle_selection_response(&self, payload: &str) -> Vec<Device> {
        let span = info_span!("usecase.pairing.selection_response");

        async {
            let devices = self.transport.parse_device_selection(payload);
            if devices.is_empty() {
                warn!("Selection response carried no devices");
            }

            self.registry.replace_devices(devices.clone()).await;

            let pending = self.lock_pending().take();
            match pending {
                Some(pending) => {
                    if pending.responder.send(devices.clone()).is_err() {
                        info!(request_id = pending.id, "Selection requester already gone");
                    }
                }
                None => info!("Selection response arrived without a pending request"),
            }
            devices
        }
        .instrument(span)
        .await
    }

    /// Whether a selection request is currently waiting.
    pub fn is_pending(&self) -> bool {
        self.lock_pending()
            .as_ref()
            .is_some_and(PendingSelection::is_live)
    }

    fn clear_pending(&self, id: u64) {
        let mut pending = self.lock_pending();
        if pending.as_ref().is_some_and(|p| p.id == id) {
            *pending = None;
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingSelection>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PendingSelection {
    /// A request whose caller went away, or whose deadline passed, no longer
    /// blocks a new one.
    fn is_live(&self) -> bool {
        !self.responder.is_closed() && Instant::now() < self.deadline
    }
}
