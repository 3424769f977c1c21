//! # Top-level Flow Stages
//!
//! The overall process position, above the individual sub-flows:
//!
//! ```text
//! Initialization ──▶ TermsAndConditions ──▶ Identification ──▶ Done
//! ```
//!
//! `Done` is additionally reachable from every stage (abort/quit). All
//! other transitions are rejected with a structured error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use idv_core::IdentificationMethod;

/// Stage of the overall identification process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    /// Resolving the identification method for this user.
    Initialization,
    /// Presenting terms and conditions for acceptance.
    TermsAndConditions,
    /// Running the sub-flow(s) for the resolved method.
    Identification {
        /// The resolved identification method.
        method: IdentificationMethod,
    },
    /// The process finished (success, failure, or quit).
    Done,
}

/// Errors for invalid stage transitions.
#[derive(Error, Debug)]
pub enum StageError {
    /// Attempted transition is not allowed by the stage machine.
    #[error("invalid flow stage transition: {from} -> {to}")]
    InvalidTransition {
        /// Current stage name.
        from: String,
        /// Attempted target stage name.
        to: String,
    },
}

impl FlowStage {
    /// The process entry stage.
    pub fn start() -> Self {
        Self::Initialization
    }

    /// Whether this stage is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Attempt a stage transition with runtime validation.
    pub fn advance_to(&mut self, to: FlowStage) -> Result<(), StageError> {
        let valid = matches!(
            (&*self, &to),
            (Self::Initialization, Self::TermsAndConditions)
                | (Self::TermsAndConditions, Self::Identification { .. })
                | (Self::Identification { .. }, Self::Identification { .. })
                | (_, Self::Done)
        );
        if !valid {
            return Err(StageError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            });
        }
        *self = to;
        Ok(())
    }
}

impl std::fmt::Display for FlowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initialization => "INITIALIZATION",
            Self::TermsAndConditions => "TERMS_AND_CONDITIONS",
            Self::Identification { .. } => "IDENTIFICATION",
            Self::Done => "DONE",
        };
        f.write_str(s)
    }
}

impl crate::codec::PersistedStep for FlowStage {
    fn initial() -> Self {
        Self::start()
    }

    fn flow_name() -> &'static str {
        "flow"
    }
}
