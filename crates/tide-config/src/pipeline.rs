//! Briefing pipeline tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_max_emails() -> u32 {
    500
}

const fn default_map_batch_size() -> u32 {
    10
}

const fn default_content_char_cap() -> u32 {
    15_000
}

const fn default_fallback_lookback_hours() -> u32 {
    24
}

const fn default_extraction_timeout_secs() -> u64 {
    60
}

const fn default_synthesis_timeout_secs() -> u64 {
    300
}

const fn default_store_timeout_secs() -> u64 {
    30
}

const fn default_lease_ttl_secs() -> u64 {
    1800
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Upper bound on documents processed per run.
    #[serde(default = "default_max_emails")]
    pub max_emails: u32,

    /// Concurrent extraction calls per map batch.
    #[serde(default = "default_map_batch_size")]
    pub map_batch_size: u32,

    /// Characters of document content sent to the extractor.
    #[serde(default = "default_content_char_cap")]
    pub content_char_cap: u32,

    /// Lookback used when no briefing has been stored yet.
    #[serde(default = "default_fallback_lookback_hours")]
    pub fallback_lookback_hours: u32,

    #[serde(default = "default_extraction_timeout_secs")]
    pub extraction_timeout_secs: u64,

    #[serde(default = "default_synthesis_timeout_secs")]
    pub synthesis_timeout_secs: u64,

    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,

    /// How long a run lease stays valid before another run may reclaim it.
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,

    /// Drop under-sourced clusters and fabricated serendipity items instead
    /// of only flagging them.
    #[serde(default)]
    pub enforce_contracts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_emails: default_max_emails(),
            map_batch_size: default_map_batch_size(),
            content_char_cap: default_content_char_cap(),
            fallback_lookback_hours: default_fallback_lookback_hours(),
            extraction_timeout_secs: default_extraction_timeout_secs(),
            synthesis_timeout_secs: default_synthesis_timeout_secs(),
            store_timeout_secs: default_store_timeout_secs(),
            lease_ttl_secs: default_lease_ttl_secs(),
            enforce_contracts: false,
        }
    }
}

impl PipelineConfig {
    pub const fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub const fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }

    pub const fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub const fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_secs)
    }

    /// Reject values that would stall or disable the pipeline.
    /// Shortest lease that outlives the longest stretch between two renewals:
    /// one model call plus the store calls that bracket it.
    #[must_use]
    pub fn min_lease_ttl_secs(&self) -> u64 {
        self.extraction_timeout_secs
            .max(self.synthesis_timeout_secs)
            .saturating_add(self.store_timeout_secs.saturating_mul(3))
    }

    pub(crate) fn zero_fields(&self) -> Vec<&'static str> {
        let checks = [
            ("pipeline.max_emails", u64::from(self.max_emails)),
            ("pipeline.map_batch_size", u64::from(self.map_batch_size)),
            ("pipeline.content_char_cap", u64::from(self.content_char_cap)),
            (
                "pipeline.fallback_lookback_hours",
                u64::from(self.fallback_lookback_hours),
            ),
            ("pipeline.extraction_timeout_secs", self.extraction_timeout_secs),
            ("pipeline.synthesis_timeout_secs", self.synthesis_timeout_secs),
            ("pipeline.store_timeout_secs", self.store_timeout_secs),
            ("pipeline.lease_ttl_secs", self.lease_ttl_secs),
        ];
        checks
            .into_iter()
            .filter(|(_, value)| *value == 0)
            .map(|(field, _)| field)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_emails, 500);
        assert_eq!(config.map_batch_size, 10);
        assert_eq!(config.content_char_cap, 15_000);
        assert_eq!(config.fallback_lookback_hours, 24);
        assert_eq!(config.synthesis_timeout(), Duration::from_secs(300));
        assert!(!config.enforce_contracts);
        assert!(config.zero_fields().is_empty());
    }

    #[test]
    fn lease_floor_covers_slowest_call_and_store_round_trips() {
        let config = PipelineConfig::default();
        assert_eq!(config.min_lease_ttl_secs(), 300 + 3 * 30);
        assert!(config.lease_ttl_secs >= config.min_lease_ttl_secs());
    }

    #[test]
    fn zero_batch_size_is_reported() {
        let config = PipelineConfig {
            map_batch_size: 0,
            ..Default::default()
        };
        assert_eq!(config.zero_fields(), vec!["pipeline.map_batch_size"]);
    }
}
