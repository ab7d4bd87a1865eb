use crate::Strategy;
use ipnetwork::IpNetwork;

/// Rewrites every record TTL of an answer to a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlOptions {
    pub rewrite: u32,
}

impl TtlOptions {
    pub fn rewrite(ttl: u32) -> Self {
        Self { rewrite: ttl }
    }
}

/// Per-call resolution options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub strategy: Strategy,
    pub disable_cache: bool,
    pub ttl: Option<TtlOptions>,
    pub client_subnet: Option<IpNetwork>,
}

impl QueryOptions {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_cache_disabled(mut self) -> Self {
        self.disable_cache = true;
        self
    }

    pub fn with_ttl_rewrite(mut self, ttl: u32) -> Self {
        self.ttl = Some(TtlOptions::rewrite(ttl));
        self
    }

    pub fn with_client_subnet(mut self, subnet: IpNetwork) -> Self {
        self.client_subnet = Some(subnet);
        self
    }
}
