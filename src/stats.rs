//! Pool statistics for monitoring and health checks.
//!
//! # Example
//!
//! ```rust,ignore
//! let stats = pool.stats();
//! println!("alive: {}, launches: {}, reuses: {}", stats.alive, stats.launches, stats.reuses);
//! ```

use serde::Serialize;

/// Snapshot of pool statistics at a point in time.
///
/// # Fields
///
/// | Field | Description |
/// |-------|-------------|
/// | `alive` | A browser is stored |
/// | `browser_id` | Id of the stored browser, if any |
/// | `launches` | Successful engine launches |
/// | `launch_failures` | Failed launch attempts |
/// | `reuses` | Acquisitions served by the warm browser |
/// | `teardowns` | Forced closes via `release(true)` or shutdown |
///
/// # Example
///
/// ```rust
/// use url2pdf_api::PoolStats;
///
/// let stats = PoolStats {
///     alive: true,
///     browser_id: Some(1),
///     launches: 1,
///     launch_failures: 0,
///     reuses: 9,
///     teardowns: 0,
/// };
///
/// assert_eq!(stats.acquisitions(), 10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub alive: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_id: Option<u64>,

    pub launches: u64,

    pub launch_failures: u64,

    /// Acquisitions that found the stored browser alive.
    ///
    /// A high ratio of `reuses` to `launches` means invocations are landing
    /// on warm hosts.
    pub reuses: u64,

    pub teardowns: u64,
}

impl PoolStats {
    /// Successful acquisitions, warm or cold.
    pub fn acquisitions(&self) -> u64 {
        self.launches + self.reuses
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies the default snapshot describes an untouched pool.
    #[test]
    fn test_pool_stats_default() {
        let stats = PoolStats::default();

        assert!(!stats.alive);
        assert_eq!(stats.browser_id, None);
        assert_eq!(stats.acquisitions(), 0);
    }

    /// Verifies the JSON shape served by the health route.
    #[test]
    fn test_pool_stats_serialization() {
        let stats = PoolStats {
            alive: true,
            browser_id: Some(3),
            launches: 2,
            launch_failures: 1,
            reuses: 5,
            teardowns: 1,
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["alive"], true);
        assert_eq!(json["browserId"], 3);
        assert_eq!(json["launchFailures"], 1);

        let idle = serde_json::to_value(PoolStats::default()).unwrap();
        assert!(idle.get("browserId").is_none());
    }
}
