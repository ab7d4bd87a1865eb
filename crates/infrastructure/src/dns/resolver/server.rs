use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use warden_dns_application::{QueryContext, ServerResolver, Transport};
use warden_dns_domain::{DomainError, QueryOptions};

use super::core::Resolver;

/// Resolves upstream server hostnames through a resolver and a bootstrap
/// transport.
pub struct TransportServerResolver {
    resolver: Arc<Resolver>,
    transport: Arc<dyn Transport>,
    options: QueryOptions,
}

impl TransportServerResolver {
    pub fn new(resolver: Arc<Resolver>, transport: Arc<dyn Transport>, options: QueryOptions) -> Self {
        Self {
            resolver,
            transport,
            options,
        }
    }
}

#[async_trait]
impl ServerResolver for TransportServerResolver {
    async fn resolve_server(
        &self,
        ctx: &QueryContext,
        host: &str,
    ) -> Result<Vec<IpAddr>, DomainError> {
        self.resolver
            .lookup(ctx, self.transport.as_ref(), host, &self.options)
            .await
    }
}
