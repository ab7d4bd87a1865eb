//! Name resolution through the operating system resolver.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use warden_dns_domain::{fqdn_to_domain, DomainError, RCodeError};

/// Resolves `hostname:port` to every socket address the system knows.
pub async fn resolve_all(
    hostname: &str,
    port: u16,
    timeout: Duration,
) -> Result<Vec<SocketAddr>, DomainError> {
    let host = fqdn_to_domain(hostname);
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }
    let target = format!("{}:{}", host, port);

    let addrs: Vec<SocketAddr> = tokio::time::timeout(timeout, tokio::net::lookup_host(&target))
        .await
        .map_err(|_| DomainError::TransportTimeout {
            server: target.clone(),
        })?
        .map_err(|e| lookup_error(&target, e))?
        .collect();

    if addrs.is_empty() {
        return Err(DomainError::Rcode(RCodeError::NAME_ERROR));
    }

    Ok(addrs)
}

/// Like [`resolve_all`] but returns bare IPs, de-duplicated, in system order.
pub async fn lookup_ips(hostname: &str, timeout: Duration) -> Result<Vec<IpAddr>, DomainError> {
    let mut ips: Vec<IpAddr> = Vec::new();
    for addr in resolve_all(hostname, 0, timeout).await? {
        if !ips.contains(&addr.ip()) {
            ips.push(addr.ip());
        }
    }
    Ok(ips)
}

// getaddrinfo reports a missing name as an opaque error, so only failures
// that are clearly local are kept as I/O errors.
fn lookup_error(target: &str, e: io::Error) -> DomainError {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::PermissionDenied => {
            DomainError::IoError(format!("DNS resolution failed for {}: {}", target, e))
        }
        _ => DomainError::Rcode(RCodeError::NAME_ERROR),
    }
}
