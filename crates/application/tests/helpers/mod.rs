#![allow(dead_code)]
use async_trait::async_trait;
use std::net::IpAddr;
use warden_dns_application::{QueryContext, Transport};
use warden_dns_domain::{DomainError, Strategy};

/// Address-only transport answering from a fixed list.
pub struct StaticTransport {
    pub name: String,
    pub addrs: Vec<IpAddr>,
}

impl StaticTransport {
    pub fn new(name: &str, addrs: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            addrs: addrs.iter().map(|a| a.parse().unwrap()).collect(),
        }
    }
}

#[async_trait]
impl Transport for StaticTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&self) {}

    fn raw(&self) -> bool {
        false
    }

    async fn lookup(
        &self,
        ctx: &QueryContext,
        _domain: &str,
        strategy: Strategy,
    ) -> Result<Vec<IpAddr>, DomainError> {
        if ctx.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        Ok(self
            .addrs
            .iter()
            .copied()
            .filter(|addr| strategy.accepts(addr))
            .collect())
    }
}
