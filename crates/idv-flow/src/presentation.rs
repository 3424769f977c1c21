//! # Presentation Boundary
//!
//! The orchestrator maps steps to abstract screens and receives
//! user-driven events back; it never inspects screen internals. A
//! presenter may be a mobile UI bridge, a terminal prompt, or a test
//! script.

use async_trait::async_trait;

use idv_core::{IdentificationStatus, MobileNumber};
use idv_state::DocumentType;

/// Abstract screens the flow can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Terms and conditions, awaiting acceptance.
    TermsAndConditions,
    /// One-time-code entry for phone verification.
    PhoneVerification {
        /// The (masked) number the code was sent to.
        number: MobileNumber,
        /// Seconds until a new code may be requested.
        resend_in: u64,
    },
    /// IBAN entry.
    IbanEntry,
    /// Waiting for the reference payment to be confirmed.
    PaymentPending,
    /// Review the application documents before signing.
    SignDocumentsConfirm,
    /// One-time-code entry for qualified signing.
    SignDocumentsCode,
    /// KYC intro screen.
    KycWelcome,
    /// Document type selection.
    KycDocumentType,
    /// Document scan in progress.
    KycDocumentScan {
        /// The document being scanned.
        document_type: DocumentType,
    },
    /// Selfie capture in progress.
    KycSelfie,
    /// Upload of captured material in progress.
    KycUpload,
    /// Capture failed but may be retried; nothing was cleared.
    KycRetry,
    /// Terminal result of the identification.
    Result {
        /// The status that ended the flow.
        status: IdentificationStatus,
    },
}

/// User-driven event emitted by a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    /// Proceed with the screen's primary action.
    Continue,
    /// Text the user entered (a code or an IBAN).
    Input(String),
    /// The user picked a document type.
    SelectDocument(DocumentType),
    /// The user asked for a new one-time code.
    RequestNewCode,
    /// The user chose to retry after a recoverable failure.
    Retry,
    /// The user quit the flow.
    Quit,
}

/// Choice offered by a transport-error alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertChoice {
    /// Retry the operation that failed.
    Retry,
    /// Quit the flow.
    Quit,
}

/// The boundary a host application implements to render the flow.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Push `screen` and wait for the user's event.
    async fn present(&self, screen: Screen) -> ScreenEvent;

    /// Wait for an event on a screen that is already being presented,
    /// without pushing it again. Hosts that cannot distinguish the two
    /// inherit plain re-presentation.
    async fn resume(&self, screen: Screen) -> ScreenEvent {
        self.present(screen).await
    }

    /// Push a passive screen (progress, terminal result). No event is
    /// awaited; the flow continues or closes on its own.
    async fn show(&self, screen: Screen);

    /// Present a dismissible retry-or-quit alert for a transport error.
    async fn alert(&self, message: String) -> AlertChoice;
}
