//! # Capture Provider Boundary
//!
//! Biometric/document capture is delegated to an external provider; the
//! orchestrator only receives "capture completed" events with structured
//! metadata, which it forwards unchanged into persistence and upload.
//!
//! Captured data accumulates in a [`CaptureContext`] owned by the KYC
//! coordinator and handed to it at construction; there is no
//! process-wide shared accumulator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use idv_state::DocumentType;

/// Metadata of one completed document scan. Opaque to the orchestrator
/// beyond the document type; the provider owns the schema of `metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentScan {
    /// The scanned document's type.
    pub document_type: DocumentType,
    /// Provider-structured scan results, forwarded unchanged.
    pub metadata: serde_json::Value,
}

/// Metadata of one completed selfie capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfieScan {
    /// Provider-structured capture results, forwarded unchanged.
    pub metadata: serde_json::Value,
}

/// Errors from the capture provider.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The user cancelled the capture.
    #[error("capture cancelled by the user")]
    Cancelled,
    /// The provider failed.
    #[error("capture provider error: {message}")]
    Provider {
        /// Provider-supplied failure description.
        message: String,
    },
}

/// The boundary to the biometric/document capture provider.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Run a document scan for `document_type`.
    async fn scan_document(&self, document_type: DocumentType)
        -> Result<DocumentScan, CaptureError>;

    /// Capture the selfie for biometric matching.
    async fn capture_selfie(&self) -> Result<SelfieScan, CaptureError>;
}

/// Coordinator-owned accumulator for captured KYC data.
///
/// Dependency-injected into the KYC coordinator; its lifetime is the
/// coordinator's lifetime, and clearing flow data drops it wholesale.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CaptureContext {
    /// The completed document scan, once captured.
    pub document: Option<DocumentScan>,
    /// The completed selfie capture, once captured.
    pub selfie: Option<SelfieScan>,
}

impl CaptureContext {
    /// A fresh, empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether everything the upload needs has been captured.
    pub fn is_complete(&self) -> bool {
        self.document.is_some() && self.selfie.is_some()
    }
}
