//! # Remote Identification Status Model
//!
//! Typed views of the status endpoint's response. The orchestrator never
//! infers a status: it decodes exactly one status per poll response and
//! classifies it as terminal or non-terminal.
//!
//! ## Forward Compatibility
//!
//! All wire enums carry a `#[serde(other)]` catch-all so that a new value
//! introduced by the service decodes to an explicit `Unknown`/`Unspecified`
//! variant instead of failing the whole response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{IdentificationUid, ReferenceToken};

// ─── Identification Status ───────────────────────────────────────────

/// Status of an identification as reported by the verification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationStatus {
    /// Identification was created but not yet started by the user.
    Created,
    /// Identification is in progress on the provider side.
    Pending,
    /// Waiting for the user to authorize (e.g. request a one-time code).
    AuthorizationRequired,
    /// Waiting for the user to confirm (e.g. enter a one-time code).
    ConfirmationRequired,
    /// Identification confirmed; a reference token is available while
    /// final settlement is outstanding.
    Confirmed,
    /// Identification completed successfully (terminal).
    ///
    /// The service emits both `successful` and `success` for this state.
    #[serde(alias = "success")]
    Successful,
    /// Identification failed (terminal). Retryability depends on the
    /// provider status code carried alongside.
    Failed,
    /// Identification was rejected by the provider (terminal).
    Rejected,
    /// Identification was flagged as fraudulent (terminal).
    Fraud,
    /// Identification data was processed; awaiting a follow-up status.
    Processed,
    /// Forward-compatible catch-all for unrecognized wire values.
    #[serde(other)]
    Unknown,
}

impl IdentificationStatus {
    /// Whether this status ends polling.
    ///
    /// Exactly `successful`, `confirmed`, `failed`, `rejected`, and
    /// `fraud` are terminal; everything else keeps the poller running.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Successful | Self::Confirmed | Self::Failed | Self::Rejected | Self::Fraud
        )
    }

    /// Whether this status always clears persisted flow data.
    pub fn clears_data(&self) -> bool {
        matches!(self, Self::Rejected | Self::Fraud)
    }
}

impl std::fmt::Display for IdentificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Pending => "PENDING",
            Self::AuthorizationRequired => "AUTHORIZATION_REQUIRED",
            Self::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            Self::Confirmed => "CONFIRMED",
            Self::Successful => "SUCCESSFUL",
            Self::Failed => "FAILED",
            Self::Rejected => "REJECTED",
            Self::Fraud => "FRAUD",
            Self::Processed => "PROCESSED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

// ─── Server-Driven Routing Step ──────────────────────────────────────

/// The step the verification service instructs the client to route to
/// next.
///
/// A closed set on our side; values the service introduces later decode
/// to [`IdentificationStep::Unspecified`], an explicit fallback variant,
/// not a silent default. Coordinators treat `Unspecified` the same as an
/// absent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationStep {
    /// Collect the user's mobile number.
    MobileNumber,
    /// Verify the mobile number with a one-time code.
    MobileNumberVerification,
    /// Collect and verify an IBAN.
    Iban,
    /// Verify account ownership through a reference payment.
    Payment,
    /// Qualified electronic signature over the application documents.
    SignDocuments,
    /// Biometric/document capture (KYC).
    DocumentScan,
    /// Biometric/document capture followed by qualified signing.
    DocumentScanSigning,
    /// Abort the flow; identification cannot continue.
    Abort,
    /// Hand over to the partner's own fallback process.
    PartnerFallback,
    /// Forward-compatible catch-all for unrecognized wire values.
    #[serde(other)]
    Unspecified,
}

impl IdentificationStep {
    /// Whether the step carries routing information.
    ///
    /// `Unspecified` decodes successfully but routes nowhere.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::Unspecified)
    }
}

impl std::fmt::Display for IdentificationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MobileNumber => "MOBILE_NUMBER",
            Self::MobileNumberVerification => "MOBILE_NUMBER_VERIFICATION",
            Self::Iban => "IBAN",
            Self::Payment => "PAYMENT",
            Self::SignDocuments => "SIGN_DOCUMENTS",
            Self::DocumentScan => "DOCUMENT_SCAN",
            Self::DocumentScanSigning => "DOCUMENT_SCAN_SIGNING",
            Self::Abort => "ABORT",
            Self::PartnerFallback => "PARTNER_FALLBACK",
            Self::Unspecified => "UNSPECIFIED",
        };
        f.write_str(s)
    }
}

// ─── Identification Method ───────────────────────────────────────────

/// The identification method resolved for the current user during
/// initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationMethod {
    /// Bank verification only.
    Bank,
    /// Bank verification, falling back to document capture on failure.
    BankWithFallback,
    /// Biometric/document capture only.
    Kyc,
    /// Biometric/document capture followed by qualified signing.
    KycWithSigning,
    /// Forward-compatible catch-all for unrecognized wire values.
    #[serde(other)]
    Unknown,
}

impl IdentificationMethod {
    /// Whether the method starts with the bank sub-flow.
    pub fn starts_with_bank(&self) -> bool {
        matches!(self, Self::Bank | Self::BankWithFallback)
    }

    /// Whether the method involves document/biometric capture.
    pub fn uses_kyc(&self) -> bool {
        matches!(self, Self::Kyc | Self::KycWithSigning)
    }

    /// Whether a signing sub-flow follows the capture sub-flow.
    pub fn requires_signing(&self) -> bool {
        matches!(self, Self::KycWithSigning)
    }
}

impl std::fmt::Display for IdentificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Bank => "BANK",
            Self::BankWithFallback => "BANK_WITH_FALLBACK",
            Self::Kyc => "KYC",
            Self::KycWithSigning => "KYC_WITH_SIGNING",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

// ─── Status Response ─────────────────────────────────────────────────

/// The subset of the status endpoint's response consumed by the
/// orchestrator. Exactly one status per response; all other fields are
/// optional and default to absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// The identification this response describes.
    pub id: IdentificationUid,
    /// Current status.
    pub status: IdentificationStatus,
    /// The step to route to next, if the service provided one.
    #[serde(default)]
    pub next_step: Option<IdentificationStep>,
    /// Alternate step to route to when the primary path has failed.
    #[serde(default)]
    pub fallback_step: Option<IdentificationStep>,
    /// Provider-specific status code (an integer rendered as a string on
    /// the wire).
    #[serde(default)]
    pub provider_status_code: Option<String>,
    /// Confirmation token, present once the status reaches `confirmed`.
    #[serde(default)]
    pub reference_token: Option<ReferenceToken>,
    /// When the identification was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Routing decision derived from a status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Follow the primary next step.
    Next(IdentificationStep),
    /// The primary path is unavailable; follow the fallback step.
    Fallback(IdentificationStep),
    /// Neither step was usable; the sub-flow must abort.
    Abort,
}

impl StatusResponse {
    /// Resolve where the flow should go after this response.
    ///
    /// A usable `next_step` always wins over `fallback_step`; a response
    /// carrying neither (or only unusable `Unspecified` values) routes to
    /// [`Route::Abort`].
    pub fn route(&self) -> Route {
        if let Some(step) = self.next_step.filter(|s| s.is_actionable()) {
            return Route::Next(step);
        }
        if let Some(step) = self.fallback_step.filter(|s| s.is_actionable()) {
            return Route::Fallback(step);
        }
        Route::Abort
    }
}
