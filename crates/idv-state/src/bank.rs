//! # Bank Sub-flow Steps
//!
//! The closed step set of the bank verification sub-flow, which also
//! hosts qualified document signing (the signing path is entered either
//! from bank verification itself or by handoff from the KYC sub-flow).
//!
//! ## Shape
//!
//! ```text
//! PhoneVerification ──▶ IbanVerification ──▶ PaymentVerification
//!                             │                      │
//!                             │            SignDocuments(ConfirmApplication)
//!                             │                      │
//!                             │            SignDocuments(Sign)
//!                             │                      │
//!                             └──── Next / Result ───┘
//!                                        │
//!                                  Quit / Close
//! ```
//!
//! Terminal positions are `Quit`, `Close`, and `Result`.

use serde::{Deserialize, Serialize};

use idv_core::{IdentificationStatus, IdentificationStep};

/// How account ownership is being verified on the IBAN screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// Plain IBAN check.
    Iban,
    /// Reference-payment check.
    Payment,
}

/// Stage of the qualified document-signing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignStage {
    /// Review and confirm the application documents.
    ConfirmApplication,
    /// Sign with a one-time code.
    Sign,
}

/// Current position within the bank sub-flow.
///
/// Deliberately no `PartialEq`: the only comparison coordinators make is
/// the idempotent navigation guard ([`BankStep::same_screen`]), and that
/// contract is partial. See the crate docs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankStep {
    /// Verify the user's mobile number with a one-time code.
    PhoneVerification,
    /// Collect and verify the IBAN.
    IbanVerification {
        /// Verification mode for this screen.
        mode: VerifyMode,
    },
    /// Await confirmation of the reference payment.
    PaymentVerification,
    /// Qualified electronic signing of the application documents.
    SignDocuments {
        /// Current signing stage.
        stage: SignStage,
    },
    /// Route to a server-driven step outside this sub-flow.
    Next {
        /// The step the service instructed us to take.
        step: IdentificationStep,
    },
    /// Present the terminal result for this identification.
    Result {
        /// The terminal status that ended the sub-flow.
        status: IdentificationStatus,
    },
    /// The user quit the sub-flow.
    Quit,
    /// The sub-flow closed after notifying its handlers.
    Close,
}

impl BankStep {
    /// The sub-flow's entry step.
    pub fn start() -> Self {
        Self::PhoneVerification
    }

    /// Whether this step ends the sub-flow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Quit | Self::Close | Self::Result { .. })
    }

    /// Idempotent navigation guard: whether `other` would present the
    /// same screen that this step already presents.
    ///
    /// This is a *partial* equality. It is defined `true` only for the
    /// pair of variants the coordinator actually compares: two
    /// `IbanVerification` steps, regardless of mode, so an IBAN screen is
    /// never pushed twice. Every other pair compares `false`, including
    /// pairs of identical variants: those are never compared in practice
    /// and re-presenting them is the desired behavior.
    pub fn same_screen(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (
                Self::IbanVerification { .. },
                Self::IbanVerification { .. }
            )
        )
    }
}

impl std::fmt::Display for BankStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PhoneVerification => "PHONE_VERIFICATION",
            Self::IbanVerification { .. } => "IBAN_VERIFICATION",
            Self::PaymentVerification => "PAYMENT_VERIFICATION",
            Self::SignDocuments { .. } => "SIGN_DOCUMENTS",
            Self::Next { .. } => "NEXT",
            Self::Result { .. } => "RESULT",
            Self::Quit => "QUIT",
            Self::Close => "CLOSE",
        };
        f.write_str(s)
    }
}

impl crate::codec::PersistedStep for BankStep {
    fn initial() -> Self {
        Self::start()
    }

    fn flow_name() -> &'static str {
        "bank"
    }
}
