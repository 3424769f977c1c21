//! # idv-core — Foundational Types for the IDV Stack
//!
//! This crate is the bedrock of the IDV Stack. It defines the type-system
//! primitives shared by every other crate in the workspace; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `SessionToken`,
//!    `IdentificationUid`, `ReferenceToken`, `MobileNumber`, `Iban`; all
//!    newtypes. No bare strings for identifiers, so a reference token can
//!    never be passed where a session token is expected.
//!
//! 2. **The orchestrator never infers status.** `IdentificationStatus` is
//!    decoded from the wire and only ever *classified*
//!    ([`IdentificationStatus::is_terminal`]); unknown wire values decode
//!    to an explicit `Unknown` variant instead of failing.
//!
//! 3. **Server-driven routing with an explicit fallback variant.**
//!    [`IdentificationStep`] carries `Unspecified` as a first-class
//!    variant for unrecognized wire values; there is no silent
//!    default-case coercion anywhere in the stack.
//!
//! 4. **Policy as configuration.** The provider status-code boundary
//!    between retryable and terminal outcomes is a configuration value
//!    ([`ProviderCodeRanges`]), not a constant scattered across call sites.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `idv-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod provider;
pub mod status;

pub use error::FlowFailure;
pub use identity::{Iban, IdentificationUid, MobileNumber, ReferenceToken, SessionToken};
pub use provider::{CodeClass, ProviderCodeRanges};
pub use status::{
    IdentificationMethod, IdentificationStatus, IdentificationStep, Route, StatusResponse,
};
