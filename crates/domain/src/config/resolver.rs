use serde::{Deserialize, Serialize};

pub const MIN_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResolverConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub disable_cache: bool,

    /// One cache for every transport instead of one keyspace per transport.
    #[serde(default)]
    pub shared_cache: bool,

    /// Keep cached answers until evicted by capacity, ignoring TTLs.
    #[serde(default)]
    pub disable_expire: bool,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_true")]
    pub rdrc_enabled: bool,

    #[serde(default = "default_rdrc_timeout_secs")]
    pub rdrc_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            disable_cache: false,
            shared_cache: false,
            disable_expire: false,
            cache_capacity: default_cache_capacity(),
            rdrc_enabled: true,
            rdrc_timeout_secs: default_rdrc_timeout_secs(),
        }
    }
}

impl ResolverConfig {
    pub fn effective_cache_capacity(&self) -> usize {
        self.cache_capacity.max(MIN_CACHE_CAPACITY)
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_cache_capacity() -> usize {
    MIN_CACHE_CAPACITY
}

fn default_true() -> bool {
    true
}

fn default_rdrc_timeout_secs() -> u64 {
    7 * 24 * 60 * 60
}
