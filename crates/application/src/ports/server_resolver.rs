use async_trait::async_trait;
use std::net::IpAddr;
use warden_dns_domain::DomainError;

use crate::QueryContext;

/// Resolves the hostname of an upstream server before a transport can dial it.
#[async_trait]
pub trait ServerResolver: Send + Sync {
    async fn resolve_server(
        &self,
        ctx: &QueryContext,
        host: &str,
    ) -> Result<Vec<IpAddr>, DomainError>;
}
