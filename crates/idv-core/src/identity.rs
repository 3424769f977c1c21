//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all identifiers in the IDV Stack. These prevent
//! accidental identifier confusion: you cannot pass a `ReferenceToken`
//! where an `IdentificationUid` is expected.
//!
//! `SessionToken` and `MobileNumber` redact their contents in `Debug`
//! output so that transcripts of a verification session never leak
//! credentials or personal data into logs.

use serde::{Deserialize, Serialize};

/// Caller-supplied token identifying one verification session.
///
/// Immutable for the lifetime of a session. A token mismatch against the
/// persisted value signals a *new* session and purges all persisted state.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

/// Unique identifier of an identification assigned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentificationUid(pub String);

/// Confirmation token returned when an identification reaches the
/// `confirmed` status (e.g. a payment reference awaiting settlement).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceToken(pub String);

/// The user's mobile number, as returned by the verification service.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MobileNumber(pub String);

/// International Bank Account Number submitted for bank verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Iban(pub String);

impl SessionToken {
    /// Access the raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl IdentificationUid {
    /// Access the raw identifier value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ReferenceToken {
    /// Access the raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl MobileNumber {
    /// Access the raw number.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number with all but the trailing two digits masked, for
    /// display on verification screens.
    pub fn masked(&self) -> String {
        let visible: String = self
            .0
            .chars()
            .rev()
            .take(2)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("*** *** {visible}")
    }
}

impl Iban {
    /// Access the raw account number.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

impl std::fmt::Debug for MobileNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MobileNumber").field(&self.masked()).finish()
    }
}

impl std::fmt::Display for IdentificationUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "identification:{}", self.0)
    }
}

impl std::fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "reference:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_debug_is_redacted() {
        let token = SessionToken("super-secret".into());
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn mobile_number_masks_all_but_last_two_digits() {
        let number = MobileNumber("+4917611122233".into());
        assert_eq!(number.masked(), "*** *** 33");
        let rendered = format!("{number:?}");
        assert!(!rendered.contains("17611122"));
    }

    #[test]
    fn uid_display_is_prefixed() {
        let uid = IdentificationUid("abc-123".into());
        assert_eq!(uid.to_string(), "identification:abc-123");
    }

    #[test]
    fn tokens_round_trip_through_serde() {
        let token = SessionToken("t-1".into());
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"t-1\"");
        let parsed: SessionToken = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, token);
    }
}
