//! Session state.
//!
//! The mutable record that travels with one verification session. It is
//! exclusively owned by the top-level orchestrator and lent by `&mut` to
//! whichever sub-flow coordinator is currently active; the borrow
//! checker enforces the single-mutator convention.
//!
//! ## Lifecycle
//!
//! Created at process start from a caller-supplied session token. If the
//! incoming token differs from the persisted one, all persisted state is
//! purged (a new session begins); otherwise every field is restored from
//! the store. Fully cleared on terminal success, terminal abort, or
//! explicit quit.

use serde::{Deserialize, Serialize};
use tracing::info;

use idv_core::{
    IdentificationMethod, IdentificationStep, IdentificationUid, MobileNumber, SessionToken,
};
use idv_store::{keys, StepStore};

/// Style/theme values supplied by the host application. Opaque to the
/// orchestrator; persisted so a resumed session renders consistently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Primary accent color (hex).
    #[serde(default)]
    pub primary_color: Option<String>,
    /// Font family override.
    #[serde(default)]
    pub font_family: Option<String>,
}

/// Mutable state of one verification session.
#[derive(Debug)]
pub struct SessionState {
    /// The session token. Immutable for the session's lifetime.
    token: SessionToken,
    /// The user's mobile number, once known.
    pub mobile_number: Option<MobileNumber>,
    /// The identification this session drives, once assigned.
    pub identification_uid: Option<IdentificationUid>,
    /// The resolved identification method.
    pub method: Option<IdentificationMethod>,
    /// Server-provided fallback step awaiting routing.
    pub fallback_step: Option<IdentificationStep>,
    /// Whether the user accepted the terms and conditions.
    pub terms_accepted: bool,
    /// Whether the mobile number has been verified.
    pub phone_verified: bool,
    /// Remaining retry budget.
    pub retry_count: u32,
    /// Whether remote logging is enabled for this session.
    pub remote_logging: bool,
    /// Host style configuration.
    pub style: StyleConfig,
}

impl SessionState {
    /// Create the session for `token`, restoring persisted state when the
    /// token matches the stored one and purging everything when it does
    /// not.
    pub fn bootstrap(token: SessionToken, store: &StepStore, default_retry_count: u32) -> Self {
        let stored: Option<SessionToken> = store.get(keys::SESSION_TOKEN);
        let same_session = stored.as_ref() == Some(&token);
        if !same_session {
            if stored.is_some() {
                info!("session token changed; purging persisted state");
            }
            store.clear();
            store.put(keys::SESSION_TOKEN, &token);
            return Self::fresh(token, default_retry_count);
        }

        Self {
            token,
            mobile_number: store.get(keys::MOBILE_NUMBER),
            identification_uid: store.get(keys::IDENTIFICATION_UID),
            method: store.get(keys::IDENTIFICATION_METHOD),
            fallback_step: store.get(keys::FALLBACK_STEP),
            terms_accepted: store.get(keys::TERMS_ACCEPTED).unwrap_or(false),
            phone_verified: store.get(keys::PHONE_VERIFIED).unwrap_or(false),
            retry_count: store.get(keys::RETRY_COUNT).unwrap_or(default_retry_count),
            remote_logging: store.get(keys::REMOTE_LOGGING).unwrap_or(false),
            style: store.get(keys::STYLE).unwrap_or_default(),
        }
    }

    fn fresh(token: SessionToken, default_retry_count: u32) -> Self {
        Self {
            token,
            mobile_number: None,
            identification_uid: None,
            method: None,
            fallback_step: None,
            terms_accepted: false,
            phone_verified: false,
            retry_count: default_retry_count,
            remote_logging: false,
            style: StyleConfig::default(),
        }
    }

    /// The session token.
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Persist every session field to the store.
    pub fn persist(&self, store: &StepStore) {
        store.put(keys::SESSION_TOKEN, &self.token);
        if let Some(number) = &self.mobile_number {
            store.put(keys::MOBILE_NUMBER, number);
        }
        if let Some(uid) = &self.identification_uid {
            store.put(keys::IDENTIFICATION_UID, uid);
        }
        if let Some(method) = &self.method {
            store.put(keys::IDENTIFICATION_METHOD, method);
        }
        if let Some(step) = &self.fallback_step {
            store.put(keys::FALLBACK_STEP, step);
        }
        store.put(keys::TERMS_ACCEPTED, &self.terms_accepted);
        store.put(keys::PHONE_VERIFIED, &self.phone_verified);
        store.put(keys::RETRY_COUNT, &self.retry_count);
        store.put(keys::REMOTE_LOGGING, &self.remote_logging);
        store.put(keys::STYLE, &self.style);
    }
}
