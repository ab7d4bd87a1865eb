use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Address family policy for a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    AsIs,
    PreferIpv4,
    PreferIpv6,
    OnlyIpv4,
    OnlyIpv6,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::AsIs => "as_is",
            Strategy::PreferIpv4 => "prefer_ipv4",
            Strategy::PreferIpv6 => "prefer_ipv6",
            Strategy::OnlyIpv4 => "only_ipv4",
            Strategy::OnlyIpv6 => "only_ipv6",
        }
    }

    /// Whether IPv4 answers may be queried under this strategy.
    pub fn allows_ipv4(&self) -> bool {
        !matches!(self, Strategy::OnlyIpv6)
    }

    pub fn allows_ipv6(&self) -> bool {
        !matches!(self, Strategy::OnlyIpv4)
    }

    /// Pins a single family, i.e. `OnlyIpv4` or `OnlyIpv6`.
    pub fn is_single_family(&self) -> bool {
        matches!(self, Strategy::OnlyIpv4 | Strategy::OnlyIpv6)
    }

    pub fn accepts(&self, addr: &IpAddr) -> bool {
        match addr {
            IpAddr::V4(_) => self.allows_ipv4(),
            IpAddr::V6(v6) if v6.to_ipv4_mapped().is_some() => self.allows_ipv4(),
            IpAddr::V6(_) => self.allows_ipv6(),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "as_is" | "asis" | "default" => Ok(Strategy::AsIs),
            "prefer_ipv4" => Ok(Strategy::PreferIpv4),
            "prefer_ipv6" => Ok(Strategy::PreferIpv6),
            "only_ipv4" | "ipv4_only" => Ok(Strategy::OnlyIpv4),
            "only_ipv6" | "ipv6_only" => Ok(Strategy::OnlyIpv6),
            other => Err(format!("Unknown domain strategy '{}'", other)),
        }
    }
}
