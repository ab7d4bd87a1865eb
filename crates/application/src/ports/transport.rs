use async_trait::async_trait;
use hickory_proto::op::Message;
use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use warden_dns_domain::{DomainError, Strategy};

use super::ServerResolver;
use crate::QueryContext;

/// Validates the addresses carried by an answer. Returning `false` rejects it.
pub type ResponseChecker = dyn Fn(&[IpAddr]) -> bool + Send + Sync;

/// A named resolution mechanism.
///
/// Raw transports exchange whole DNS messages; the others can only turn a
/// domain into addresses through [`Transport::lookup`]. Lifecycle is
/// constructed, `start`, serving, `reset` (drops pooled state), `close`.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self) -> Result<(), DomainError> {
        Ok(())
    }

    fn reset(&self) {}

    fn close(&self);

    fn raw(&self) -> bool;

    async fn exchange(
        &self,
        _ctx: &QueryContext,
        _message: &Message,
    ) -> Result<Message, DomainError> {
        Err(DomainError::RawUnsupported(self.name().to_string()))
    }

    async fn lookup(
        &self,
        ctx: &QueryContext,
        domain: &str,
        strategy: Strategy,
    ) -> Result<Vec<IpAddr>, DomainError>;
}

/// Everything a registered constructor gets to build one transport.
#[derive(Clone)]
pub struct TransportOptions {
    pub name: String,
    /// Context the transport uses when it needs to resolve its own server
    /// name. The registry nests it inside `name` before calling the constructor.
    pub context: QueryContext,
    pub address: String,
    pub client_subnet: Option<IpNetwork>,
    pub timeout: Option<Duration>,
    pub server_resolver: Option<Arc<dyn ServerResolver>>,
}

impl TransportOptions {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: QueryContext::new(),
            address: address.into(),
            client_subnet: None,
            timeout: None,
            server_resolver: None,
        }
    }

    pub fn with_client_subnet(mut self, subnet: IpNetwork) -> Self {
        self.client_subnet = Some(subnet);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_server_resolver(mut self, resolver: Arc<dyn ServerResolver>) -> Self {
        self.server_resolver = Some(resolver);
        self
    }

    pub fn with_context(mut self, context: QueryContext) -> Self {
        self.context = context;
        self
    }
}

pub type TransportConstructor =
    Arc<dyn Fn(TransportOptions) -> Result<Arc<dyn Transport>, DomainError> + Send + Sync>;
