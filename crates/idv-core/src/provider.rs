//! # Provider Status-Code Classification
//!
//! The KYC provider reports a numeric status code alongside a `failed`
//! identification status. Codes fall into a retryable band (the user may
//! try the capture again, nothing is cleared) or a terminal band (the
//! flow aborts and persisted data is purged).
//!
//! The exact band boundaries are a *configuration* value. The issuing
//! service documents them inconsistently at the edges, so call sites must
//! only ever see the classification result, never the raw ranges.

use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};

/// Classification of a provider status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeClass {
    /// The user may retry the capture; no persisted data is cleared.
    Retryable,
    /// The flow aborts; persisted flow data is cleared.
    Terminal,
}

/// Configurable retry/abort bands for provider status codes.
///
/// Defaults: codes in `1001..4000` are retryable, codes in `4000..=5000`
/// are terminal. Everything else, including codes outside both bands and
/// codes that do not parse as integers, classifies as terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCodeRanges {
    /// Band of codes after which the user may retry.
    pub retryable: Range<u32>,
    /// Band of codes that terminate the flow.
    pub terminal: RangeInclusive<u32>,
}

impl Default for ProviderCodeRanges {
    fn default() -> Self {
        Self {
            retryable: 1001..4000,
            terminal: 4000..=5000,
        }
    }
}

impl ProviderCodeRanges {
    /// Classify a raw provider status code as carried on the wire.
    ///
    /// Absent and unparsable codes classify as [`CodeClass::Terminal`]:
    /// with no readable code there is no basis for offering a retry.
    pub fn classify(&self, raw: Option<&str>) -> CodeClass {
        match raw.and_then(|s| s.trim().parse::<u32>().ok()) {
            Some(code) if self.retryable.contains(&code) => CodeClass::Retryable,
            Some(_) | None => CodeClass::Terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mid_band_code_is_retryable() {
        let ranges = ProviderCodeRanges::default();
        assert_eq!(ranges.classify(Some("2500")), CodeClass::Retryable);
    }

    #[test]
    fn terminal_band_code_aborts() {
        let ranges = ProviderCodeRanges::default();
        assert_eq!(ranges.classify(Some("4500")), CodeClass::Terminal);
    }

    #[test]
    fn band_edges() {
        let ranges = ProviderCodeRanges::default();
        assert_eq!(ranges.classify(Some("1000")), CodeClass::Terminal);
        assert_eq!(ranges.classify(Some("1001")), CodeClass::Retryable);
        assert_eq!(ranges.classify(Some("3999")), CodeClass::Retryable);
        assert_eq!(ranges.classify(Some("4000")), CodeClass::Terminal);
        assert_eq!(ranges.classify(Some("5000")), CodeClass::Terminal);
        assert_eq!(ranges.classify(Some("5001")), CodeClass::Terminal);
    }

    #[test]
    fn unparsable_code_is_terminal() {
        let ranges = ProviderCodeRanges::default();
        assert_eq!(ranges.classify(Some("not-a-code")), CodeClass::Terminal);
        assert_eq!(ranges.classify(Some("")), CodeClass::Terminal);
        assert_eq!(ranges.classify(None), CodeClass::Terminal);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let ranges = ProviderCodeRanges::default();
        assert_eq!(ranges.classify(Some(" 2500 ")), CodeClass::Retryable);
    }

    #[test]
    fn custom_ranges_are_respected() {
        let ranges = ProviderCodeRanges {
            retryable: 100..200,
            terminal: 200..=300,
        };
        assert_eq!(ranges.classify(Some("150")), CodeClass::Retryable);
        assert_eq!(ranges.classify(Some("250")), CodeClass::Terminal);
        assert_eq!(ranges.classify(Some("2500")), CodeClass::Terminal);
    }

    proptest! {
        // Every possible code classifies without panicking, and retryable
        // classifications only ever come from inside the retryable band.
        #[test]
        fn classification_is_total(code in any::<u32>()) {
            let ranges = ProviderCodeRanges::default();
            let class = ranges.classify(Some(&code.to_string()));
            if class == CodeClass::Retryable {
                prop_assert!(ranges.retryable.contains(&code));
            }
        }
    }
}
