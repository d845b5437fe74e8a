//! The single output queue a filter may publish into.
//!
//! State is shared between the producer (the ingesting filter) and anyone
//! holding a [`FilterHandle`]. The lock is only held for attach, close and the
//! non-blocking send; never across a read or a receive.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crossbeam_channel::{Sender, TrySendError};
use parking_lot::Mutex;

use super::summary::BlockSummary;

/// Consumer half of a filter's output queue.
///
/// Yields summaries in block order and disconnects once the filter stops.
pub type BlockReceiver = crossbeam_channel::Receiver<BlockSummary>;

enum OutputState {
    Detached,
    Attached(Sender<BlockSummary>),
    Closed,
}

/// Outcome of handing one summary to the output queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Sent,
    /// Queue full; the new summary was discarded.
    Dropped,
    /// Nothing attached, or the consumer hung up.
    Unattached,
}

pub(crate) struct SharedOutput {
    state: Mutex<OutputState>,
    stopped: AtomicBool,
}

impl SharedOutput {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(OutputState::Detached),
            stopped: AtomicBool::new(false),
        }
    }

    /// Create the queue if none has ever been attached.
    pub(crate) fn attach(&self, capacity: usize) -> Option<BlockReceiver> {
        let mut state = self.state.lock();
        match *state {
            OutputState::Detached => {
                let (tx, rx) = crossbeam_channel::bounded(capacity);
                *state = OutputState::Attached(tx);
                Some(rx)
            }
            OutputState::Attached(_) | OutputState::Closed => None,
        }
    }

    pub(crate) fn deliver(&self, summary: BlockSummary) -> Delivery {
        let state = self.state.lock();
        match &*state {
            OutputState::Attached(tx) => match tx.try_send(summary) {
                Ok(()) => Delivery::Sent,
                Err(TrySendError::Full(_)) => Delivery::Dropped,
                Err(TrySendError::Disconnected(_)) => Delivery::Unattached,
            },
            OutputState::Detached | OutputState::Closed => Delivery::Unattached,
        }
    }

    /// Close the queue and mark the filter stopped. Idempotent.
    pub(crate) fn stop(&self) {
        // Dropping the sender disconnects the receiver once it drains.
        *self.state.lock() = OutputState::Closed;
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// Cloneable, thread-safe handle that can stop a filter while another thread
/// is inside `TargetFilter::ingest`.
///
/// Stopping closes the output queue immediately. The ingest loop notices at
/// its next sample; a read already blocked in the source is not interrupted.
#[derive(Clone)]
pub struct FilterHandle {
    pub(crate) shared: Arc<SharedOutput>,
}

impl FilterHandle {
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }
}

impl std::fmt::Debug for FilterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterHandle")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
