//! Subcommand handlers. Results go to stdout, logs to stderr.

use anyhow::Context;
use hickory_proto::rr::RecordType;
use ipnetwork::IpNetwork;
use std::str::FromStr;
use warden_dns_application::QueryContext;
use warden_dns_domain::{Config, QueryOptions, Strategy};
use warden_dns_infrastructure::dns::resolver::format_record;
use warden_dns_infrastructure::dns::transport::build_query;

use crate::di::DnsServices;

pub struct QueryRequest<'a> {
    pub domain: &'a str,
    pub record_type: &'a str,
    pub server: Option<&'a str>,
    pub strategy: &'a str,
    pub subnet: Option<&'a str>,
    pub ttl: Option<u32>,
}

pub fn list_upstreams(config: &Config) {
    if config.upstreams.is_empty() {
        println!("(none, the system resolver is used)");
        return;
    }
    for upstream in &config.upstreams {
        match &upstream.client_subnet {
            Some(subnet) => println!("{}\t{}\tsubnet={}", upstream.name, upstream.address, subnet),
            None => println!("{}\t{}", upstream.name, upstream.address),
        }
    }
}

pub async fn lookup(
    services: &DnsServices,
    domain: &str,
    server: Option<&str>,
    strategy: &str,
) -> anyhow::Result<()> {
    let strategy = Strategy::from_str(strategy).map_err(anyhow::Error::msg)?;
    let transport = services.transport(server)?;
    let options = QueryOptions::default().with_strategy(strategy);

    let addrs = services
        .resolver
        .lookup(&QueryContext::new(), transport, domain, &options)
        .await
        .with_context(|| format!("Lookup of {} via {} failed", domain, transport.name()))?;

    for addr in addrs {
        println!("{}", addr);
    }
    Ok(())
}

pub async fn query(services: &DnsServices, request: QueryRequest<'_>) -> anyhow::Result<()> {
    let record_type = RecordType::from_str(&request.record_type.to_ascii_uppercase())
        .map_err(|e| anyhow::anyhow!("Invalid record type '{}': {}", request.record_type, e))?;
    let strategy = Strategy::from_str(request.strategy).map_err(anyhow::Error::msg)?;

    let mut options = QueryOptions::default().with_strategy(strategy);
    if let Some(subnet) = request.subnet {
        let subnet = IpNetwork::from_str(subnet)
            .with_context(|| format!("Invalid client subnet '{}'", subnet))?;
        options = options.with_client_subnet(subnet);
    }
    if let Some(ttl) = request.ttl {
        options = options.with_ttl_rewrite(ttl);
    }

    let message = build_query(request.domain, record_type)?;

    let transport = services.transport(request.server)?;
    let response = services
        .resolver
        .exchange(&QueryContext::new(), transport, &message, &options)
        .await
        .with_context(|| format!("Query via {} failed", transport.name()))?;

    println!(";; status: {:?}, id: {}", response.response_code(), response.id());
    for record in response.answers() {
        println!("{}", format_record(record));
    }
    Ok(())
}
