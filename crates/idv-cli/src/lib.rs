//! # idv-cli — Terminal Driver for the IDV Stack
//!
//! Runs a complete verification flow in the terminal against a scripted
//! in-process service, and inspects persisted flow stores. Intended for
//! demos and manual smoke-testing of the orchestrator; production hosts
//! embed `idv-flow` with their own presenter and API client.

pub mod demo;
pub mod run;
pub mod store;
pub mod terminal;
