//! Connection settings shared by every store handle

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where the database lives and how connections behave
///
/// Cheap to clone: worker tasks each take a copy and open their own connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file (`:memory:` for single-connection tests)
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Seconds a leased unit stays hidden from other leases
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,

    /// How long a connection waits on a locked database (milliseconds)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_path() -> PathBuf {
    PathBuf::from("edgar_filings.db")
}

fn default_lease_ttl_secs() -> u64 {
    600
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            lease_ttl_secs: default_lease_ttl_secs(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Settings for a database at `path`, other fields defaulted
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Lease TTL as a Duration
    pub fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_secs)
    }

    /// Busy timeout as a Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Whether this points at a private in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("store.path must not be empty".to_string());
        }
        if self.lease_ttl_secs == 0 {
            return Err("store.lease_ttl_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
