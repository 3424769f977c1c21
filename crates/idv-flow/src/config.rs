//! Orchestrator configuration.

use std::time::Duration;

use idv_core::ProviderCodeRanges;

/// Tunables for the flow orchestrator and its sub-flow coordinators.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Retry/abort bands for provider status codes.
    pub provider_codes: ProviderCodeRanges,
    /// Retry budget granted to a fresh session.
    pub default_retry_count: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            provider_codes: ProviderCodeRanges::default(),
            default_retry_count: 5,
        }
    }
}
