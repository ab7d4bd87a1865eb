use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::info;
use warden_dns_application::{RdrcFactory, RdrcStore};
use warden_dns_domain::config::resolver::MIN_CACHE_CAPACITY;
use warden_dns_domain::ResolverConfig;

use super::core::Resolver;
use crate::dns::cache::{CacheMode, MessageCache};
use crate::dns::rdrc::MemoryRdrcStore;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ResolverBuilder {
    timeout: Duration,
    disable_cache: bool,
    shared_cache: bool,
    disable_expire: bool,
    cache_capacity: usize,
    rdrc_factory: Option<RdrcFactory>,
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            disable_cache: false,
            shared_cache: false,
            disable_expire: false,
            cache_capacity: MIN_CACHE_CAPACITY,
            rdrc_factory: None,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut builder = Self::new()
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_cache_capacity(config.cache_capacity);
        builder.disable_cache = config.disable_cache;
        builder.shared_cache = config.shared_cache;
        builder.disable_expire = config.disable_expire;
        if config.rdrc_enabled {
            let timeout = Duration::from_secs(config.rdrc_timeout_secs);
            builder = builder.with_rdrc(Arc::new(move || {
                Arc::new(MemoryRdrcStore::new(timeout)) as Arc<dyn RdrcStore>
            }));
        }
        builder
    }

    /// Zero keeps the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    pub fn with_cache_disabled(mut self) -> Self {
        self.disable_cache = true;
        self
    }

    pub fn with_shared_cache(mut self) -> Self {
        self.shared_cache = true;
        self
    }

    pub fn with_expire_disabled(mut self) -> Self {
        self.disable_expire = true;
        self
    }

    /// Capacities below 1024 are raised to 1024.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(MIN_CACHE_CAPACITY);
        self
    }

    pub fn with_rdrc(mut self, factory: RdrcFactory) -> Self {
        self.rdrc_factory = Some(factory);
        self
    }

    pub fn build(self) -> Resolver {
        let cache_mode = if self.shared_cache {
            CacheMode::Shared
        } else {
            CacheMode::PerTransport
        };

        info!(
            timeout_ms = self.timeout.as_millis() as u64,
            disable_cache = self.disable_cache,
            shared_cache = self.shared_cache,
            disable_expire = self.disable_expire,
            cache_capacity = self.cache_capacity,
            rdrc = self.rdrc_factory.is_some(),
            "Building DNS resolver"
        );

        Resolver {
            timeout: self.timeout,
            disable_cache: self.disable_cache,
            cache: MessageCache::new(self.cache_capacity, self.disable_expire),
            cache_mode,
            rdrc_factory: self.rdrc_factory,
            rdrc: OnceLock::new(),
        }
    }
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
