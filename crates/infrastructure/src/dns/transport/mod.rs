pub mod endpoint;
pub mod local;
pub mod registry;
pub mod system;
pub mod subnet;
pub mod tcp;
pub mod udp;

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;
use warden_dns_application::{QueryContext, Transport};
use warden_dns_domain::{to_fqdn, DomainError, RCodeError, Strategy};

pub use local::LocalTransport;
pub use registry::{create_transport, register_transport, TransportRegistry};
pub use subnet::ClientSubnetTransport;
pub use tcp::TcpTransport;
pub use udp::UdpTransport;

pub const DEFAULT_DNS_PORT: u16 = 53;
pub const DEFAULT_TRANSPORT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn encode_message(message: &Message) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).map_err(|e| {
        DomainError::InvalidDnsResponse(format!("Failed to serialize DNS message: {}", e))
    })?;
    Ok(buf)
}

pub(crate) fn decode_message(bytes: &[u8]) -> Result<Message, DomainError> {
    Message::from_vec(bytes)
        .map_err(|e| DomainError::InvalidDnsResponse(format!("Failed to parse DNS message: {}", e)))
}

/// Builds a recursive query with a random ID.
pub fn build_query(domain: &str, record_type: RecordType) -> Result<Message, DomainError> {
    let fqdn = to_fqdn(domain);
    let name = Name::from_str(&fqdn).map_err(|e| {
        DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", domain, e))
    })?;
    let mut message = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(Query::query(name, record_type));
    Ok(message)
}

/// Address lookup for raw transports: one A and/or AAAA exchange per allowed
/// family, sequentially. Used by transports when they are asked for addresses
/// directly instead of through the resolver.
pub(crate) async fn lookup_via_exchange<T: Transport + ?Sized>(
    transport: &T,
    ctx: &QueryContext,
    domain: &str,
    strategy: Strategy,
) -> Result<Vec<IpAddr>, DomainError> {
    let mut families = Vec::with_capacity(2);
    if strategy.allows_ipv4() {
        families.push(RecordType::A);
    }
    if strategy.allows_ipv6() {
        families.push(RecordType::AAAA);
    }
    if strategy == Strategy::PreferIpv6 {
        families.reverse();
    }

    let mut addrs = Vec::new();
    let mut first_error = None;
    for record_type in families {
        let result = async {
            let response = transport
                .exchange(ctx, &build_query(domain, record_type)?)
                .await?;
            let rcode = RCodeError::from(response.response_code());
            if rcode != RCodeError::SUCCESS {
                return Err(DomainError::Rcode(rcode));
            }
            Ok(crate::dns::resolver::message_to_addrs(&response))
        }
        .await;
        match result {
            Ok(found) => addrs.extend(found),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if addrs.is_empty() => Err(e),
        _ => Ok(addrs),
    }
}
