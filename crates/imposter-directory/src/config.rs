//! Directory configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retention and capacity limits for stored sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// How long a session may go untouched before it is treated as gone.
    ///
    /// Default: 24 hours.
    pub retention: Duration,

    /// Maximum number of sessions kept at once. Creating one more evicts
    /// the least recently used. 0 means unbounded.
    ///
    /// Default: 10 000.
    pub capacity: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(24 * 60 * 60),
            capacity: 10_000,
        }
    }
}
