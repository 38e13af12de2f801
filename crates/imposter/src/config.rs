//! Server configuration.

use std::time::Duration;

use imposter_directory::DirectoryConfig;

use crate::ImposterError;

/// Environment variable for the listen address.
pub const ENV_BIND: &str = "IMPOSTER_BIND";
/// Environment variable for session retention, in seconds.
pub const ENV_RETENTION_SECS: &str = "IMPOSTER_RETENTION_SECS";
/// Environment variable for the maximum number of stored games.
pub const ENV_CAPACITY: &str = "IMPOSTER_CAPACITY";

/// Settings for an [`ImposterServer`](crate::ImposterServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on. Default: `127.0.0.1:8080`.
    pub bind_addr: String,

    /// Retention and capacity of the game directory.
    pub directory: DirectoryConfig,

    /// How often expired games are purged. Default: 60 seconds.
    pub purge_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            directory: DirectoryConfig::default(),
            purge_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Builds a config from `IMPOSTER_*` environment variables, falling
    /// back to defaults for any that are unset.
    ///
    /// # Errors
    /// [`ImposterError::Config`] if a numeric variable doesn't parse.
    pub fn from_env() -> Result<Self, ImposterError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ImposterError> {
        let mut config = Self::default();

        if let Some(addr) = lookup(ENV_BIND) {
            config.bind_addr = addr;
        }
        if let Some(secs) = lookup(ENV_RETENTION_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                ImposterError::Config(format!("{ENV_RETENTION_SECS}={secs:?}: {e}"))
            })?;
            config.directory.retention = Duration::from_secs(secs);
        }
        if let Some(capacity) = lookup(ENV_CAPACITY) {
            config.directory.capacity = capacity.trim().parse().map_err(|e| {
                ImposterError::Config(format!("{ENV_CAPACITY}={capacity:?}: {e}"))
            })?;
        }

        Ok(config)
    }
}
