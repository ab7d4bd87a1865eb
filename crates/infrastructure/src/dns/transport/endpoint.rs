use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;
use warden_dns_application::{QueryContext, ServerResolver, TransportOptions};
use warden_dns_domain::{DomainError, UpstreamAddr};

use super::system::resolve_all;
use super::{DEFAULT_DNS_PORT, DEFAULT_TRANSPORT_TIMEOUT};

/// Server address of a wire transport. Hostnames are resolved once, lazily.
///
/// Resolution goes through the configured [`ServerResolver`] with the
/// transport's own context, so a resolver that would route the query back into
/// this transport fails with a loopback error instead of recursing.
pub(crate) struct ServerEndpoint {
    addr: UpstreamAddr,
    resolved: OnceCell<SocketAddr>,
    context: QueryContext,
    server_resolver: Option<Arc<dyn ServerResolver>>,
    pub(crate) timeout: Duration,
}

impl ServerEndpoint {
    pub(crate) fn from_options(options: &TransportOptions) -> Result<Self, DomainError> {
        let addr = UpstreamAddr::parse(&options.address, DEFAULT_DNS_PORT)
            .map_err(DomainError::UnknownTransportFormat)?;
        let resolved = match addr.socket_addr() {
            Some(socket_addr) => OnceCell::new_with(Some(socket_addr)),
            None => OnceCell::new(),
        };
        Ok(Self {
            addr,
            resolved,
            context: options.context.clone(),
            server_resolver: options.server_resolver.clone(),
            timeout: options.timeout.unwrap_or(DEFAULT_TRANSPORT_TIMEOUT),
        })
    }

    pub(crate) async fn socket_addr(&self) -> Result<SocketAddr, DomainError> {
        self.resolved
            .get_or_try_init(|| self.resolve())
            .await
            .copied()
    }

    async fn resolve(&self) -> Result<SocketAddr, DomainError> {
        let (host, port) = match &self.addr {
            UpstreamAddr::Resolved(addr) => return Ok(*addr),
            UpstreamAddr::Unresolved { hostname, port } => (hostname.as_ref(), *port),
        };
        let resolved = match &self.server_resolver {
            Some(resolver) => resolver
                .resolve_server(&self.context, host)
                .await?
                .into_iter()
                .map(|ip| SocketAddr::new(ip, port))
                .next(),
            None => resolve_all(host, port, self.timeout).await?.into_iter().next(),
        };
        let resolved = resolved.ok_or_else(|| {
            DomainError::InvalidDomainName(format!("No addresses found for {}", host))
        })?;
        debug!(server = %self.addr, resolved = %resolved, "Resolved upstream server");
        Ok(resolved)
    }

    pub(crate) fn server(&self) -> String {
        self.addr.to_string()
    }
}
