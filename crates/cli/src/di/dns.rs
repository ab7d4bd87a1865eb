use anyhow::Context;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use warden_dns_application::{ServerResolver, Transport, TransportOptions};
use warden_dns_domain::{Config, QueryOptions};
use warden_dns_infrastructure::dns::transport::local::LOCAL_ADDRESS;
use warden_dns_infrastructure::dns::{create_transport, Resolver, ResolverBuilder, TransportServerResolver};

/// Name of the transport used when no upstream is configured, and to resolve
/// upstream servers given by hostname.
const SYSTEM_TRANSPORT: &str = "system";

pub struct DnsServices {
    pub resolver: Arc<Resolver>,
    transports: Vec<Arc<dyn Transport>>,
}

impl DnsServices {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let resolver = Arc::new(ResolverBuilder::from_config(&config.resolver).build());
        resolver.start();

        let timeout = Duration::from_secs(config.resolver.timeout_secs);
        let system = create_transport(
            TransportOptions::new(SYSTEM_TRANSPORT, LOCAL_ADDRESS).with_timeout(timeout),
        )?;
        let server_resolver: Arc<dyn ServerResolver> = Arc::new(TransportServerResolver::new(
            Arc::clone(&resolver),
            Arc::clone(&system),
            QueryOptions::default(),
        ));

        let mut transports = Vec::with_capacity(config.upstreams.len());
        for upstream in &config.upstreams {
            let mut options = TransportOptions::new(&upstream.name, &upstream.address)
                .with_timeout(timeout)
                .with_server_resolver(Arc::clone(&server_resolver));
            if let Some(subnet) = upstream
                .parsed_client_subnet()
                .map_err(anyhow::Error::msg)?
            {
                options = options.with_client_subnet(subnet);
            }
            let transport = create_transport(options)
                .with_context(|| format!("Failed to create upstream '{}'", upstream.name))?;
            transports.push(transport);
        }

        if transports.is_empty() {
            info!("No upstreams configured, using the system resolver");
        }
        transports.push(system);

        Self::start_transports(&transports).await;

        info!(transports = transports.len(), "DNS services initialized");
        Ok(Self {
            resolver,
            transports,
        })
    }

    async fn start_transports(transports: &[Arc<dyn Transport>]) {
        let results = join_all(transports.iter().map(|transport| transport.start())).await;
        for (transport, result) in transports.iter().zip(results) {
            if let Err(e) = result {
                warn!(transport = transport.name(), error = %e, "Failed to start transport");
            }
        }
    }

    /// The named transport, or the first configured one.
    pub fn transport(&self, name: Option<&str>) -> anyhow::Result<&dyn Transport> {
        let transport = match name {
            Some(name) => self.transports.iter().find(|t| t.name() == name),
            None => self.transports.first(),
        };
        transport
            .map(|t| t.as_ref())
            .with_context(|| format!("Unknown upstream '{}'", name.unwrap_or_default()))
    }

    pub fn shutdown(&self) {
        for transport in &self.transports {
            transport.close();
        }
        info!("DNS services shut down");
    }
}
