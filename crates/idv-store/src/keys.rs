//! # Fixed Store Keys
//!
//! The flat key namespace of the persistent step store. One identifier
//! per persisted field; coordinators only ever touch their own keys.

/// Session token the persisted state belongs to.
pub const SESSION_TOKEN: &str = "session_token";

/// Current step of the bank sub-flow.
pub const BANK_STEP: &str = "bank_step";

/// Current step of the KYC sub-flow.
pub const KYC_STEP: &str = "kyc_step";

/// Current top-level flow stage.
pub const FLOW_STAGE: &str = "flow_stage";

/// Identification UID assigned by the verification service.
pub const IDENTIFICATION_UID: &str = "identification_uid";

/// Resolved identification method.
pub const IDENTIFICATION_METHOD: &str = "identification_method";

/// Server-provided fallback step, pending routing.
pub const FALLBACK_STEP: &str = "fallback_step";

/// Whether the user accepted the terms and conditions.
pub const TERMS_ACCEPTED: &str = "terms_accepted";

/// Whether the mobile number was verified.
pub const PHONE_VERIFIED: &str = "phone_verified";

/// Remaining retry budget for the identification.
pub const RETRY_COUNT: &str = "retry_count";

/// The user's mobile number.
pub const MOBILE_NUMBER: &str = "mobile_number";

/// Style/theme configuration supplied by the host application.
pub const STYLE: &str = "style";

/// Whether remote logging was enabled for this session.
pub const REMOTE_LOGGING: &str = "remote_logging";
