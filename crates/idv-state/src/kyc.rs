//! # KYC Sub-flow Steps
//!
//! The closed step set of the biometric/document capture sub-flow.
//! Capture itself is delegated to an external provider; these steps only
//! describe where the user is between capture interactions.

use serde::{Deserialize, Serialize};

use idv_core::IdentificationStatus;

/// Identity document types the capture provider can scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Travel passport.
    Passport,
    /// National identity card.
    IdCard,
    /// Residence permit.
    ResidencePermit,
    /// Driver's license (accepted in a subset of jurisdictions).
    DriversLicense,
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Passport => "PASSPORT",
            Self::IdCard => "ID_CARD",
            Self::ResidencePermit => "RESIDENCE_PERMIT",
            Self::DriversLicense => "DRIVERS_LICENSE",
        };
        f.write_str(s)
    }
}

/// Current position within the KYC sub-flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStep {
    /// Intro screen describing the capture process.
    Welcome,
    /// The user picks which document to present.
    DocumentTypeSelection,
    /// Scanning the selected document.
    DocumentScan {
        /// The document being scanned.
        document_type: DocumentType,
    },
    /// Capturing the selfie for biometric matching.
    Selfie,
    /// Packaging and uploading the captured material.
    Upload,
    /// Present the terminal result for this identification.
    Result {
        /// The terminal status that ended the sub-flow.
        status: IdentificationStatus,
    },
    /// The user quit the sub-flow.
    Quit,
}

impl KycStep {
    /// The sub-flow's entry step.
    pub fn start() -> Self {
        Self::Welcome
    }

    /// Whether this step ends the sub-flow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Quit | Self::Result { .. })
    }
}

impl std::fmt::Display for KycStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "WELCOME",
            Self::DocumentTypeSelection => "DOCUMENT_TYPE_SELECTION",
            Self::DocumentScan { .. } => "DOCUMENT_SCAN",
            Self::Selfie => "SELFIE",
            Self::Upload => "UPLOAD",
            Self::Result { .. } => "RESULT",
            Self::Quit => "QUIT",
        };
        f.write_str(s)
    }
}

impl crate::codec::PersistedStep for KycStep {
    fn initial() -> Self {
        Self::start()
    }

    fn flow_name() -> &'static str {
        "kyc"
    }
}
