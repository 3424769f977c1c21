//! Scripted in-process verification service for terminal runs.
//!
//! Behaves like a tiny stateful backend: IBAN submission routes into
//! document signing, and status polls report `pending` twice before
//! turning terminal. Good enough to exercise every orchestrator path
//! without a network.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use idv_client::{
    ApiError, IdentificationApi, MethodResolution, OtcAuthorization, OtcConfirmation,
};
use idv_core::{
    Iban, IdentificationMethod, IdentificationStatus, IdentificationStep, IdentificationUid,
    MobileNumber, StatusResponse,
};
use idv_flow::{CaptureError, CaptureProvider, DocumentScan, SelfieScan};
use idv_state::DocumentType;

/// How many polls report `pending` before the terminal status.
const PENDING_POLLS: usize = 2;

/// In-process stand-in for the verification service.
pub struct DemoService {
    method: IdentificationMethod,
    id: IdentificationUid,
    polls: Mutex<usize>,
}

impl DemoService {
    /// A demo service resolving to `method`, with a freshly assigned
    /// identification.
    pub fn new(method: IdentificationMethod) -> Self {
        Self {
            method,
            id: IdentificationUid(uuid::Uuid::new_v4().to_string()),
            polls: Mutex::new(0),
        }
    }

    fn polls(&self) -> std::sync::MutexGuard<'_, usize> {
        match self.polls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl IdentificationApi for DemoService {
    async fn resolve_method(&self) -> Result<MethodResolution, ApiError> {
        Ok(MethodResolution {
            method: self.method,
            id: self.id.clone(),
        })
    }

    async fn get_identification(
        &self,
        uid: &IdentificationUid,
    ) -> Result<StatusResponse, ApiError> {
        let mut polls = self.polls();
        *polls += 1;
        let status = if *polls <= PENDING_POLLS {
            IdentificationStatus::Pending
        } else {
            IdentificationStatus::Successful
        };
        Ok(StatusResponse {
            id: uid.clone(),
            status,
            next_step: None,
            fallback_step: None,
            provider_status_code: None,
            reference_token: None,
            created_at: None,
        })
    }

    async fn verify_iban(
        &self,
        uid: &IdentificationUid,
        _iban: &Iban,
    ) -> Result<StatusResponse, ApiError> {
        // Fresh verification round for the post-signing polls.
        *self.polls() = 0;
        Ok(StatusResponse {
            id: uid.clone(),
            status: IdentificationStatus::AuthorizationRequired,
            next_step: Some(IdentificationStep::SignDocuments),
            fallback_step: None,
            provider_status_code: None,
            reference_token: None,
            created_at: None,
        })
    }

    async fn authorize_one_time_code(
        &self,
        uid: &IdentificationUid,
    ) -> Result<OtcAuthorization, ApiError> {
        Ok(OtcAuthorization {
            id: uid.clone(),
            new_code_in_secs: 5,
        })
    }

    async fn verify_one_time_code(
        &self,
        uid: &IdentificationUid,
        code: &str,
    ) -> Result<OtcConfirmation, ApiError> {
        Ok(OtcConfirmation {
            id: uid.clone(),
            verified: !code.trim().is_empty(),
        })
    }

    async fn get_mobile_number(&self) -> Result<MobileNumber, ApiError> {
        Ok(MobileNumber("+4917611122233".into()))
    }
}

/// Capture provider that pretends to scan.
pub struct DemoCapture;

#[async_trait]
impl CaptureProvider for DemoCapture {
    async fn scan_document(
        &self,
        document_type: DocumentType,
    ) -> Result<DocumentScan, CaptureError> {
        tokio::time::sleep(Duration::from_millis(400)).await;
        Ok(DocumentScan {
            document_type,
            metadata: serde_json::json!({"pages": 2, "mrz": {"valid": true}}),
        })
    }

    async fn capture_selfie(&self) -> Result<SelfieScan, CaptureError> {
        tokio::time::sleep(Duration::from_millis(400)).await;
        Ok(SelfieScan {
            metadata: serde_json::json!({"liveness": "passed"}),
        })
    }
}
