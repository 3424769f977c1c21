//! Typed sub-flow outcomes.
//!
//! Each coordinator exposes exactly one outcome channel; composition is
//! done by the parent subscribing to the child's channel. There are no
//! ad-hoc callback chains, and delivery is exactly-once: a coordinator
//! that has already delivered ignores everything that happens afterwards.

use tokio::sync::mpsc;
use tracing::debug;

use idv_core::{FlowFailure, IdentificationStep, IdentificationUid, ReferenceToken};

/// Terminal outcome of a sub-flow coordinator.
#[derive(Debug, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The identification completed successfully.
    Success {
        /// The completed identification.
        id: IdentificationUid,
    },
    /// The identification is confirmed and awaiting final settlement.
    Confirmed {
        /// The confirmed identification.
        id: IdentificationUid,
        /// Confirmation token, when the service provided one.
        reference: ReferenceToken,
    },
    /// The sub-flow ended by handing the user over to another sub-flow.
    NextStep {
        /// Where the service routed the user.
        step: IdentificationStep,
    },
    /// The sub-flow failed terminally.
    Failure(FlowFailure),
}

/// One-shot sender half of a coordinator's outcome channel.
///
/// Wraps an `mpsc` sender with the exactly-once guard: the first
/// delivery wins, later attempts are logged and dropped.
#[derive(Debug)]
pub struct OutcomeSender {
    tx: mpsc::Sender<FlowOutcome>,
    delivered: bool,
}

impl OutcomeSender {
    /// Create a fresh outcome channel.
    pub fn channel() -> (Self, mpsc::Receiver<FlowOutcome>) {
        let (tx, rx) = mpsc::channel(1);
        (
            Self {
                tx,
                delivered: false,
            },
            rx,
        )
    }

    /// Deliver the coordinator's outcome. At most one delivery ever goes
    /// through; subsequent calls are ignored.
    pub fn deliver(&mut self, outcome: FlowOutcome) {
        if self.delivered {
            debug!(?outcome, "outcome already delivered; ignoring");
            return;
        }
        self.delivered = true;
        // Capacity 1 and the delivered guard make this send infallible
        // unless the receiver is gone, which is equally final.
        if self.tx.try_send(outcome).is_err() {
            debug!("outcome receiver dropped before delivery");
        }
    }

    /// Whether the outcome has been delivered.
    pub fn is_delivered(&self) -> bool {
        self.delivered
    }
}
