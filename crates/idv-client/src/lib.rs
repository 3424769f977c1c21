//! # idv-client — Typed Client for the Verification API
//!
//! Provides typed access to the remote identification service consumed
//! by the flow orchestrator:
//!
//! - method resolution (`resolve_method`)
//! - identification status (`get_identification`)
//! - one-time-code authorization and confirmation
//! - the user's registered mobile number
//!
//! ## Architecture
//!
//! The orchestrator only ever sees the [`IdentificationApi`] trait; the
//! reqwest-backed [`VerificationClient`] is one implementation of it.
//! Tests and the CLI drive the same flows through scripted in-process
//! implementations.
//!
//! All transport failures surface as [`ApiError`] values with the
//! endpoint label attached; never panics, never silent swallowing.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub(crate) mod retry;

pub use api::{IdentificationApi, MethodResolution, OtcAuthorization, OtcConfirmation};
pub use config::{ApiConfig, ConfigError};
pub use error::ApiError;
pub use http::VerificationClient;
