//! Pass configuration types.
//!
//! Provides typed configuration for collective combining with bon builders.
//! Supports both explicit configuration and environment variable fallbacks.

use bon::bon;

/// Default byte budget for a combined all-gather (256 MiB).
pub const DEFAULT_COMBINE_THRESHOLD_BYTES: u64 = 256 * 1024 * 1024;

/// Default member budget for a combined all-gather.
pub const DEFAULT_COMBINE_THRESHOLD_COUNT: u64 = 256;

/// Configuration for the all-gather combiner.
///
/// Both thresholds are inclusive upper bounds on a single combined group.
/// Setting either to zero disables combining entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinerConfig {
    /// Maximum total output bytes a combined gather may produce.
    pub combine_threshold_bytes: u64,
    /// Maximum number of gathers merged into one.
    pub combine_threshold_count: u64,
}

impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            combine_threshold_bytes: DEFAULT_COMBINE_THRESHOLD_BYTES,
            combine_threshold_count: DEFAULT_COMBINE_THRESHOLD_COUNT,
        }
    }
}

#[bon]
impl CombinerConfig {
    /// Create a combiner configuration with builder pattern.
    #[builder]
    pub fn builder(
        #[builder(default = DEFAULT_COMBINE_THRESHOLD_BYTES)] combine_threshold_bytes: u64,
        #[builder(default = DEFAULT_COMBINE_THRESHOLD_COUNT)] combine_threshold_count: u64,
    ) -> Self {
        Self { combine_threshold_bytes, combine_threshold_count }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `HAIL_COMBINE_THRESHOLD_BYTES` - Byte budget per combined gather (default: 256 MiB)
    /// * `HAIL_COMBINE_THRESHOLD_COUNT` - Member budget per combined gather (default: 256)
    pub fn from_env() -> Self {
        let combine_threshold_bytes = std::env::var("HAIL_COMBINE_THRESHOLD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_COMBINE_THRESHOLD_BYTES);
        let combine_threshold_count = std::env::var("HAIL_COMBINE_THRESHOLD_COUNT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_COMBINE_THRESHOLD_COUNT);

        Self { combine_threshold_bytes, combine_threshold_count }
    }

    /// Check whether this configuration disables combining.
    pub fn is_disabled(&self) -> bool {
        self.combine_threshold_bytes == 0 || self.combine_threshold_count == 0
    }
}

// ============================================================================
// TESTS
// ============================================================================
