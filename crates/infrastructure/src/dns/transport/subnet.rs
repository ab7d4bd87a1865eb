use async_trait::async_trait;
use hickory_proto::op::Message;
use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::sync::Arc;
use warden_dns_application::{QueryContext, Transport};
use warden_dns_domain::{DomainError, Strategy};

use crate::dns::edns::set_client_subnet;

/// Stamps an EDNS0 client subnet on every raw exchange, then delegates.
///
/// An option already present on the message (for instance one set per query
/// by the resolver) is left alone.
pub struct ClientSubnetTransport {
    inner: Arc<dyn Transport>,
    subnet: IpNetwork,
}

impl ClientSubnetTransport {
    pub fn new(inner: Arc<dyn Transport>, subnet: IpNetwork) -> Self {
        Self { inner, subnet }
    }
}

#[async_trait]
impl Transport for ClientSubnetTransport {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn start(&self) -> Result<(), DomainError> {
        self.inner.start().await
    }

    fn reset(&self) {
        self.inner.reset()
    }

    fn close(&self) {
        self.inner.close()
    }

    fn raw(&self) -> bool {
        self.inner.raw()
    }

    async fn exchange(&self, ctx: &QueryContext, message: &Message) -> Result<Message, DomainError> {
        let message = set_client_subnet(message, self.subnet, false);
        self.inner.exchange(ctx, &message).await
    }

    async fn lookup(
        &self,
        ctx: &QueryContext,
        domain: &str,
        strategy: Strategy,
    ) -> Result<Vec<IpAddr>, DomainError> {
        self.inner.lookup(ctx, domain, strategy).await
    }
}
