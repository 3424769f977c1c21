//! # idv-state — The Step Model
//!
//! Closed step enumerations for every sub-flow of the identification
//! process. Each enum is a tagged union over the positions a user can
//! occupy within that sub-flow; exactly one step is active per sub-flow
//! at any time.
//!
//! ## Step Sets
//!
//! - **Bank** (`bank.rs`): phone verification through IBAN/payment
//!   verification and qualified document signing.
//! - **KYC** (`kyc.rs`): document-type selection, document scan, selfie,
//!   upload.
//! - **Top-level** (`stage.rs`): `Initialization → TermsAndConditions →
//!   Identification → Done`.
//!
//! ## Durable Codec
//!
//! Steps persist across process restarts as JSON bytes
//! ([`PersistedStep`]). Decoding an unrecognized or corrupted
//! representation never fails: it falls back to the sub-flow's initial
//! step and logs a warning, so a broken persistence record restarts that
//! sub-flow from the beginning instead of wedging the whole process.
//!
//! ## Partial Screen Equality
//!
//! [`BankStep`] deliberately does NOT implement `PartialEq`. The only
//! comparison coordinators perform is the idempotent navigation guard,
//! exposed as [`BankStep::same_screen`], defined for the variant pairs
//! the guard compares and `false` for everything else. Callers rely on
//! that narrow behavior; a total equality would invite misuse.

pub mod bank;
pub mod codec;
pub mod kyc;
pub mod stage;

pub use bank::{BankStep, SignStage, VerifyMode};
pub use codec::PersistedStep;
pub use kyc::{DocumentType, KycStep};
pub use stage::{FlowStage, StageError};
