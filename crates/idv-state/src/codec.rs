//! # Durable Step Codec
//!
//! Serialization contract for persisted steps. Encoding is plain JSON;
//! decoding is fail-soft: any malformed, truncated, or unrecognized
//! representation yields the sub-flow's initial step with a warning. A
//! corrupted persistence record therefore restarts that sub-flow from the
//! beginning; it never panics, and it never surfaces to the user.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// A step value that can round-trip through the persistent store.
pub trait PersistedStep: Serialize + DeserializeOwned {
    /// The sub-flow's defined entry step, used as the decode fallback.
    fn initial() -> Self;

    /// Short name of the sub-flow, for log context.
    fn flow_name() -> &'static str;

    /// Encode the step to its durable byte representation.
    ///
    /// Encoding a closed enum cannot fail in practice; if it ever does,
    /// the empty representation is persisted and decodes back to the
    /// initial step, which keeps the fail-soft contract intact.
    fn encode(&self) -> Vec<u8> {
        match serde_json::to_vec(self) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(flow = Self::flow_name(), %err, "step encoding failed");
                Vec::new()
            }
        }
    }

    /// Decode a durable representation, falling back to [`initial`] on
    /// any error.
    ///
    /// [`initial`]: PersistedStep::initial
    fn decode_or_initial(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(step) => step,
            Err(err) => {
                warn!(
                    flow = Self::flow_name(),
                    %err,
                    "persisted step did not decode; restarting sub-flow from its initial step"
                );
                Self::initial()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{BankStep, VerifyMode};
    use crate::kyc::KycStep;
    use crate::stage::FlowStage;

    #[test]
    fn bank_step_round_trips() {
        let step = BankStep::IbanVerification {
            mode: VerifyMode::Payment,
        };
        let decoded = BankStep::decode_or_initial(&step.encode());
        assert!(decoded.same_screen(&step));
    }

    #[test]
    fn corrupted_bytes_fall_back_to_initial() {
        let decoded = BankStep::decode_or_initial(b"{\"iban_verification\": 17");
        assert!(matches!(decoded, BankStep::PhoneVerification));
    }

    #[test]
    fn unrecognized_variant_falls_back_to_initial() {
        let decoded = KycStep::decode_or_initial(b"\"teleport_to_branch\"");
        assert_eq!(decoded, KycStep::Welcome);
    }

    #[test]
    fn empty_bytes_fall_back_to_initial() {
        let decoded = FlowStage::decode_or_initial(b"");
        assert_eq!(decoded, FlowStage::Initialization);
    }
}
