//! Cable sink seam
//!
//! The sink is the downstream publish/subscribe registry that charging and
//! the USB stack observe. It does not deduplicate, so the engine never
//! announces the same transition twice.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::cable::Cable;
use crate::events::MuicEvent;

/// Receiver of cable attach/detach announcements
pub trait CableSink: Send {
    fn report(&mut self, cable: Cable, attached: bool);
}

/// One announcement made to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableReport {
    pub cable: Cable,
    pub attached: bool,
}

/// Sink that forwards announcements onto the engine event stream
///
/// Waits for room in the channel, so it must be driven from a blocking
/// thread (the actor runs every pass on one), never from an async task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<MuicEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<MuicEvent>) -> Self {
        Self { tx }
    }
}

impl CableSink for ChannelSink {
    fn report(&mut self, cable: Cable, attached: bool) {
        let event = if attached {
            MuicEvent::CableAttached { cable }
        } else {
            MuicEvent::CableDetached { cable }
        };
        if self.tx.blocking_send(event).is_err() {
            warn!("Dropped cable event for {}: event channel closed", cable);
        }
    }
}

/// Sink that keeps every announcement, shareable with the code inspecting it
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    reports: Arc<Mutex<Vec<CableReport>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything reported so far
    pub fn reports(&self) -> Vec<CableReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take everything reported so far
    pub fn drain(&self) -> Vec<CableReport> {
        std::mem::take(&mut *self.reports.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl CableSink for RecordingSink {
    fn report(&mut self, cable: Cable, attached: bool) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CableReport { cable, attached });
    }
}
