use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// An upstream server address that may or may not be resolved to an IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpstreamAddr {
    Resolved(SocketAddr),
    Unresolved { hostname: Arc<str>, port: u16 },
}

impl UpstreamAddr {
    /// Parses `host`, `host:port`, `[v6]:port` or a bare IP, with an optional
    /// `scheme://` prefix which is ignored. Missing ports take `default_port`.
    pub fn parse(address: &str, default_port: u16) -> Result<Self, String> {
        let rest = match address.split_once("://") {
            Some((_, rest)) => rest,
            None => address,
        };
        let rest = rest.trim_end_matches('/');

        if rest.is_empty() {
            return Err(format!("Invalid address '{}'", address));
        }
        if let Ok(addr) = rest.parse::<SocketAddr>() {
            return Ok(UpstreamAddr::Resolved(addr));
        }
        if let Ok(ip) = rest.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
            return Ok(UpstreamAddr::Resolved(SocketAddr::new(ip, default_port)));
        }
        if let Some((host, port)) = parse_host_port(rest) {
            return Ok(UpstreamAddr::Unresolved {
                hostname: host.into(),
                port,
            });
        }
        if rest.contains(':') || rest.contains('/') {
            return Err(format!("Invalid address '{}'", address));
        }
        Ok(UpstreamAddr::Unresolved {
            hostname: rest.into(),
            port: default_port,
        })
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            UpstreamAddr::Resolved(addr) => Some(*addr),
            UpstreamAddr::Unresolved { .. } => None,
        }
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamAddr::Resolved(addr) => write!(f, "{}", addr),
            UpstreamAddr::Unresolved { hostname, port } => write!(f, "{}:{}", hostname, port),
        }
    }
}

fn parse_host_port(s: &str) -> Option<(&str, u16)> {
    if s.starts_with('[') {
        let end = s.find(']')?;
        let host = &s[1..end];
        let rest = &s[end + 1..];
        let port_str = rest.strip_prefix(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    } else {
        let (host, port_str) = s.rsplit_once(':')?;
        if host.is_empty() || host.contains(':') {
            return None;
        }
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    }
}

/// Returns the scheme of `address` (`"udp"` for `udp://1.1.1.1`), or an empty
/// string when the address carries none.
pub fn address_scheme(address: &str) -> &str {
    match address.split_once("://") {
        Some((scheme, _)) => scheme,
        None => "",
    }
}
