//! The `IdentificationApi` boundary.
//!
//! Everything the flow orchestrator needs from the remote service, as an
//! async trait. The reqwest client implements it for production; tests
//! and the CLI provide scripted implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use idv_core::{
    Iban, IdentificationMethod, IdentificationUid, MobileNumber, StatusResponse,
};

use crate::error::ApiError;

/// Result of method resolution during initialization.
///
/// Resolving the method also creates (or resumes) the identification on
/// the service side, so the assigned UID travels with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodResolution {
    /// The identification method enabled for this user.
    pub method: IdentificationMethod,
    /// The identification assigned to this session.
    pub id: IdentificationUid,
}

/// Result of authorizing a one-time code: the service has dispatched a
/// code to the user's mobile number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtcAuthorization {
    /// The identification the code authorizes.
    pub id: IdentificationUid,
    /// Seconds until a new code may be requested.
    #[serde(default = "default_new_code_timeout")]
    pub new_code_in_secs: u64,
}

fn default_new_code_timeout() -> u64 {
    30
}

/// Result of submitting a one-time code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtcConfirmation {
    /// The identification the code confirmed.
    pub id: IdentificationUid,
    /// Whether the code was accepted.
    pub verified: bool,
}

/// Asynchronous boundary to the remote verification service.
///
/// All operations return a typed value or a classified [`ApiError`];
/// nothing here blocks, and nothing here retries business outcomes;
/// bounded transport retry lives inside the implementation.
#[async_trait]
pub trait IdentificationApi: Send + Sync {
    /// Resolve which identification method is enabled for this user and
    /// which identification this session drives.
    async fn resolve_method(&self) -> Result<MethodResolution, ApiError>;

    /// Fetch the current status of an identification.
    async fn get_identification(
        &self,
        uid: &IdentificationUid,
    ) -> Result<StatusResponse, ApiError>;

    /// Submit the user's IBAN for account verification. The response
    /// carries the resulting status and routing steps.
    async fn verify_iban(
        &self,
        uid: &IdentificationUid,
        iban: &Iban,
    ) -> Result<StatusResponse, ApiError>;

    /// Ask the service to send a one-time code to the user's mobile
    /// number.
    async fn authorize_one_time_code(
        &self,
        uid: &IdentificationUid,
    ) -> Result<OtcAuthorization, ApiError>;

    /// Submit the one-time code the user entered.
    async fn verify_one_time_code(
        &self,
        uid: &IdentificationUid,
        code: &str,
    ) -> Result<OtcConfirmation, ApiError>;

    /// Fetch the mobile number registered for the current user.
    async fn get_mobile_number(&self) -> Result<MobileNumber, ApiError>;
}
