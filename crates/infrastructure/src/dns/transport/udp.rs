//! UDP Transport for DNS queries (RFC 1035 §4.2.1)
//!
//! Standard DNS transport. Messages are sent as-is (no framing), one datagram
//! per exchange on a fresh ephemeral socket.

use async_trait::async_trait;
use hickory_proto::op::Message;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};
use warden_dns_application::{QueryContext, Transport, TransportOptions};
use warden_dns_domain::{DomainError, Strategy};

use super::endpoint::ServerEndpoint;
use super::{decode_message, encode_message, lookup_via_exchange};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// DNS over UDP transport
pub struct UdpTransport {
    name: String,
    endpoint: ServerEndpoint,
    closed: AtomicBool,
}

impl UdpTransport {
    pub fn new(options: TransportOptions) -> Result<Self, DomainError> {
        Ok(Self {
            endpoint: ServerEndpoint::from_options(&options)?,
            name: options.name,
            closed: AtomicBool::new(false),
        })
    }

    pub fn constructor(options: TransportOptions) -> Result<Arc<dyn Transport>, DomainError> {
        Ok(Arc::new(Self::new(options)?))
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DomainError::TransportClosed(self.name.clone()));
        }
        Ok(())
    }

    async fn send(
        &self,
        server_addr: SocketAddr,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DomainError> {
        let bind_addr = if server_addr.is_ipv4() {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to bind UDP socket: {}", e)))?;

        let bytes_sent = tokio::time::timeout(timeout, socket.send_to(message_bytes, server_addr))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server_addr.to_string(),
            })?
            .map_err(|e| {
                DomainError::IoError(format!(
                    "Failed to send UDP query to {}: {}",
                    server_addr, e
                ))
            })?;

        debug!(server = %server_addr, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let receive = async {
            loop {
                let (bytes_received, from_addr) =
                    socket.recv_from(&mut recv_buf).await.map_err(|e| {
                        DomainError::IoError(format!(
                            "Failed to receive UDP response from {}: {}",
                            server_addr, e
                        ))
                    })?;

                if from_addr.ip() != server_addr.ip() {
                    warn!(
                        expected = %server_addr,
                        received_from = %from_addr,
                        "UDP response from unexpected source"
                    );
                    continue;
                }
                let response = &recv_buf[..bytes_received];
                match validate_response_id(message_bytes, response, server_addr) {
                    Ok(()) => return Ok::<_, DomainError>(response.to_vec()),
                    // Late answer to an earlier query on a reused port.
                    Err(e) => debug!(error = %e, "Discarding UDP datagram"),
                }
            }
        };

        let response = tokio::time::timeout(timeout, receive)
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server_addr.to_string(),
            })??;

        debug!(
            server = %server_addr,
            bytes_received = response.len(),
            "UDP response received"
        );

        Ok(response)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.endpoint.socket_addr().await.map(|_| ())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn raw(&self) -> bool {
        true
    }

    async fn exchange(&self, _ctx: &QueryContext, message: &Message) -> Result<Message, DomainError> {
        self.ensure_open()?;
        let server_addr = self.endpoint.socket_addr().await?;
        let bytes = encode_message(message)?;
        let response = self.send(server_addr, &bytes, self.endpoint.timeout).await?;
        decode_message(&response)
    }

    async fn lookup(
        &self,
        ctx: &QueryContext,
        domain: &str,
        strategy: Strategy,
    ) -> Result<Vec<IpAddr>, DomainError> {
        lookup_via_exchange(self, ctx, domain, strategy).await
    }
}

pub(crate) fn validate_response_id(
    query: &[u8],
    response: &[u8],
    server_addr: SocketAddr,
) -> Result<(), DomainError> {
    if query.len() < 2 || response.len() < 2 {
        return Err(DomainError::InvalidDnsResponse(format!(
            "Truncated DNS message from {}",
            server_addr
        )));
    }
    let query_id = u16::from_be_bytes([query[0], query[1]]);
    let response_id = u16::from_be_bytes([response[0], response[1]]);
    if query_id != response_id {
        return Err(DomainError::InvalidDnsResponse(format!(
            "DNS ID mismatch from {}: expected {}, got {}",
            server_addr, query_id, response_id
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "udp_test.rs"]
mod tests;
