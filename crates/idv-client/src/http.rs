//! Reqwest-backed implementation of [`IdentificationApi`].
//!
//! ## API Path Convention
//!
//! All endpoints live under `{base_url}/api/v1/`. Identification status
//! is `GET /api/v1/identifications/{uid}`; one-time-code operations hang
//! off the identification resource.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use idv_core::{
    Iban, IdentificationMethod, IdentificationUid, MobileNumber, StatusResponse,
};

use crate::api::{IdentificationApi, MethodResolution, OtcAuthorization, OtcConfirmation};
use crate::config::{ApiConfig, ConfigError};
use crate::error::ApiError;
use crate::retry;

/// API version path prefix.
const API_PREFIX: &str = "api/v1";

/// Envelope for the method-resolution endpoint.
#[derive(Debug, Deserialize)]
struct MethodEnvelope {
    identification_method: IdentificationMethod,
    id: IdentificationUid,
}

/// Envelope for the mobile-number endpoint.
#[derive(Debug, Deserialize)]
struct MobileNumberEnvelope {
    number: MobileNumber,
}

/// Production client for the verification service.
#[derive(Debug, Clone)]
pub struct VerificationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl VerificationClient {
    /// Create a new client from configuration.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&format!(
                        "Bearer {}",
                        config.api_token
                    ))
                    .map_err(|_| ApiError::Config(ConfigError::MissingToken))?,
                );
                headers
            })
            .build()
            .map_err(|e| ApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}/{path}", self.base_url)
    }

    /// Shared response handling: non-success statuses become
    /// [`ApiError::Api`] with the body attached, success bodies decode
    /// into `T`.
    async fn read_json<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        resp: reqwest::Response,
    ) -> Result<T, ApiError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }
        resp.json().await.map_err(|e| ApiError::Deserialization {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl IdentificationApi for VerificationClient {
    /// Calls `GET {base}/api/v1/identification_method`.
    async fn resolve_method(&self) -> Result<MethodResolution, ApiError> {
        let endpoint = "GET /identification_method";
        let url = self.url("identification_method");

        let resp = retry::retry_send(|| self.http.get(&url).send())
            .await
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let envelope: MethodEnvelope = Self::read_json(endpoint, resp).await?;
        Ok(MethodResolution {
            method: envelope.identification_method,
            id: envelope.id,
        })
    }

    /// Calls `GET {base}/api/v1/identifications/{uid}`.
    async fn get_identification(
        &self,
        uid: &IdentificationUid,
    ) -> Result<StatusResponse, ApiError> {
        let endpoint = format!("GET /identifications/{}", uid.as_str());
        let url = self.url(&format!("identifications/{}", uid.as_str()));

        let resp = retry::retry_send(|| self.http.get(&url).send())
            .await
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        Self::read_json(&endpoint, resp).await
    }

    /// Calls `POST {base}/api/v1/identifications/{uid}/iban`.
    async fn verify_iban(
        &self,
        uid: &IdentificationUid,
        iban: &Iban,
    ) -> Result<StatusResponse, ApiError> {
        let endpoint = format!("POST /identifications/{}/iban", uid.as_str());
        let url = self.url(&format!("identifications/{}/iban", uid.as_str()));
        let body = serde_json::json!({ "iban": iban });

        let resp = retry::retry_send(|| self.http.post(&url).json(&body).send())
            .await
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        Self::read_json(&endpoint, resp).await
    }

    /// Calls `POST {base}/api/v1/identifications/{uid}/authorize`.
    async fn authorize_one_time_code(
        &self,
        uid: &IdentificationUid,
    ) -> Result<OtcAuthorization, ApiError> {
        let endpoint = format!("POST /identifications/{}/authorize", uid.as_str());
        let url = self.url(&format!("identifications/{}/authorize", uid.as_str()));

        let resp = retry::retry_send(|| self.http.post(&url).send())
            .await
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        Self::read_json(&endpoint, resp).await
    }

    /// Calls `PATCH {base}/api/v1/identifications/{uid}/confirm`.
    async fn verify_one_time_code(
        &self,
        uid: &IdentificationUid,
        code: &str,
    ) -> Result<OtcConfirmation, ApiError> {
        let endpoint = format!("PATCH /identifications/{}/confirm", uid.as_str());
        let url = self.url(&format!("identifications/{}/confirm", uid.as_str()));
        let body = serde_json::json!({ "token": code });

        let resp = retry::retry_send(|| self.http.patch(&url).json(&body).send())
            .await
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        Self::read_json(&endpoint, resp).await
    }

    /// Calls `GET {base}/api/v1/mobile_number`.
    async fn get_mobile_number(&self) -> Result<MobileNumber, ApiError> {
        let endpoint = "GET /mobile_number";
        let url = self.url("mobile_number");

        let resp = retry::retry_send(|| self.http.get(&url).send())
            .await
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let envelope: MobileNumberEnvelope = Self::read_json(endpoint, resp).await?;
        Ok(envelope.number)
    }
}
