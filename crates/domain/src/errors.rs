use crate::rcode::RCodeError;
use hickory_proto::op::Message;
use std::net::IpAddr;
use thiserror::Error;

/// Payload handed back alongside [`DomainError::ResponseRejected`].
///
/// A rejected answer is still returned to the caller so a higher level
/// policy can decide whether to use it anyway.
#[derive(Debug, Clone)]
pub enum Rejection {
    Response(Box<Message>),
    Addresses(Vec<IpAddr>),
}

impl Rejection {
    pub fn response(&self) -> Option<&Message> {
        match self {
            Rejection::Response(message) => Some(message),
            Rejection::Addresses(_) => None,
        }
    }

    pub fn addresses(&self) -> Option<&[IpAddr]> {
        match self {
            Rejection::Addresses(addrs) => Some(addrs),
            Rejection::Response(_) => None,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Raw query not supported by transport {0}")]
    RawUnsupported(String),

    #[error("DNS query loopback in transport[{0}]")]
    Loopback(String),

    #[error("Response rejected (cached)")]
    ResponseRejectedCached,

    #[error("Response rejected")]
    ResponseRejected(Rejection),

    #[error("Not cached")]
    NotCached,

    #[error(transparent)]
    Rcode(#[from] RCodeError),

    #[error("Unknown DNS server format: {0}")]
    UnknownTransportFormat(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Query cancelled")]
    Cancelled,

    #[error("Transport timeout connecting to {server}")]
    TransportTimeout { server: String },

    #[error("Transport connection refused by {server}")]
    TransportConnectionRefused { server: String },

    #[error("Transport {0} is closed")]
    TransportClosed(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl DomainError {
    /// True for both the live and the cached rejection outcome.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            DomainError::ResponseRejected(_) | DomainError::ResponseRejectedCached
        )
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    pub fn rejected_response(&self) -> Option<&Message> {
        match self {
            DomainError::ResponseRejected(rejection) => rejection.response(),
            _ => None,
        }
    }

    pub fn rcode(&self) -> Option<RCodeError> {
        match self {
            DomainError::Rcode(code) => Some(*code),
            _ => None,
        }
    }
}
