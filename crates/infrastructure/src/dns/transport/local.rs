//! Address-only transport backed by the operating system resolver.

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use warden_dns_application::{QueryContext, Transport, TransportOptions};
use warden_dns_domain::{DomainError, RCodeError, Strategy};

use super::system::lookup_ips;
use super::DEFAULT_TRANSPORT_TIMEOUT;

pub const LOCAL_ADDRESS: &str = "local";

pub struct LocalTransport {
    name: String,
    timeout: Duration,
    closed: AtomicBool,
}

impl LocalTransport {
    pub fn new(options: TransportOptions) -> Self {
        Self {
            name: options.name,
            timeout: options.timeout.unwrap_or(DEFAULT_TRANSPORT_TIMEOUT),
            closed: AtomicBool::new(false),
        }
    }

    pub fn constructor(options: TransportOptions) -> Result<Arc<dyn Transport>, DomainError> {
        Ok(Arc::new(Self::new(options)))
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn raw(&self) -> bool {
        false
    }

    async fn lookup(
        &self,
        _ctx: &QueryContext,
        domain: &str,
        strategy: Strategy,
    ) -> Result<Vec<IpAddr>, DomainError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DomainError::TransportClosed(self.name.clone()));
        }
        let addrs: Vec<IpAddr> = lookup_ips(domain, self.timeout)
            .await?
            .into_iter()
            .filter(|addr| strategy.accepts(addr))
            .collect();
        if addrs.is_empty() {
            return Err(DomainError::Rcode(RCodeError::NAME_ERROR));
        }
        Ok(addrs)
    }
}
