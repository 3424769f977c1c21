//! # Flow Failure Taxonomy
//!
//! The typed failures a verification flow can surface to its external
//! completion callback. These are *business* outcomes; transport and
//! decoding errors are handled at the layer that produced them and only
//! reach this taxonomy once they are terminal for the flow.

use thiserror::Error;

/// Terminal failure of a verification flow, delivered exactly once
/// through the external completion callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowFailure {
    /// A required sub-flow module is unavailable in this build.
    #[error("required sub-flow module is not available: {module}")]
    ModulesNotFound {
        /// Name of the missing module.
        module: String,
    },

    /// The user quit, or the flow was forcibly aborted.
    #[error("action not authorized: the user quit or the flow was aborted")]
    UnauthorizedAction,

    /// Status polling ended in a terminal failure.
    #[error("identification authorization failed")]
    AuthorizationFailed,

    /// The partner declined the fallback path; identification cannot
    /// proceed by any available method.
    #[error("identification is not possible for this account")]
    IdentificationNotPossible,

    /// The service answered with an unexpected or absent step.
    #[error("unsupported response from the verification service: {detail}")]
    UnsupportedResponse {
        /// What was unexpected about the response.
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages_name_the_condition() {
        let failure = FlowFailure::ModulesNotFound {
            module: "bank".into(),
        };
        assert!(failure.to_string().contains("bank"));

        let failure = FlowFailure::UnsupportedResponse {
            detail: "no next_step".into(),
        };
        assert!(failure.to_string().contains("no next_step"));
    }
}
