//! # idv-flow — The Identification Flow Orchestrator
//!
//! Coordinates a user through the multi-path identity-verification
//! process: mobile-number verification, IBAN/bank verification,
//! biometric/document capture, and qualified e-signature. The flow is
//! resumable across process restarts, polls the verification service for
//! asynchronous outcomes, and applies retry/fallback policy on failure.
//!
//! ## Components
//!
//! - [`poller`]: timer-driven status verification and the new-code
//!   countdown. At most one concurrent poll per sub-flow; dropping the
//!   poller invalidates everything it owns.
//! - [`session`]: the mutable session record, restored field-by-field
//!   when the session token matches the persisted one and purged when it
//!   does not.
//! - [`bank`] / [`kyc`]: sub-flow coordinators. Each owns its step
//!   state machine, persists every transition *before* initiating the
//!   step's side effect, and reports a typed outcome exactly once.
//! - [`orchestrator`]: the top-level flow: initialization, terms,
//!   identification, done. Composes sub-flow coordinators by channel
//!   subscription and owns abort/quit/cleanup.
//!
//! ## Concurrency Model
//!
//! One logical flow of control per coordinator: a coordinator is in
//! exactly one step at a time, and a new transition never starts while a
//! network call for the same coordinator is outstanding. The two timers
//! of the poller are the only sanctioned concurrency, and each is
//! singular: starting a new instance cancels the prior one.

pub mod bank;
pub mod capture;
pub mod config;
pub mod kyc;
pub mod orchestrator;
pub mod outcome;
pub mod poller;
pub mod presentation;
pub mod session;

pub use bank::BankCoordinator;
pub use capture::{CaptureContext, CaptureError, CaptureProvider, DocumentScan, SelfieScan};
pub use config::FlowConfig;
pub use kyc::KycCoordinator;
pub use orchestrator::{FlowOrchestrator, FlowResult};
pub use outcome::{FlowOutcome, OutcomeSender};
pub use poller::{PollOutcome, StatusPoller};
pub use presentation::{AlertChoice, Presenter, Screen, ScreenEvent};
pub use session::{SessionState, StyleConfig};
