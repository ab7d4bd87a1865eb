use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

/// One named DNS server, turned into a transport through the registry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub name: String,

    /// `udp://1.1.1.1`, `tcp://[2606:4700::1111]:53`, `8.8.8.8`, `local`, ...
    pub address: String,

    /// EDNS0 client subnet stamped on every raw exchange, e.g. `203.0.113.0/24`.
    #[serde(default)]
    pub client_subnet: Option<String>,
}

impl UpstreamConfig {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            client_subnet: None,
        }
    }

    pub fn parsed_client_subnet(&self) -> Result<Option<IpNetwork>, String> {
        match &self.client_subnet {
            None => Ok(None),
            Some(raw) => raw
                .parse::<IpNetwork>()
                .map(Some)
                .map_err(|e| format!("Invalid client subnet '{}': {}", raw, e)),
        }
    }
}
