//! TCP Transport for DNS queries (RFC 1035 §4.2.2)
//!
//! Every message is framed with a two-byte big-endian length. Idle connections
//! are pooled per transport instance and dropped by `reset`.

use async_trait::async_trait;
use hickory_proto::op::Message;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use warden_dns_application::{QueryContext, Transport, TransportOptions};
use warden_dns_domain::{DomainError, Strategy};

use super::endpoint::ServerEndpoint;
use super::{decode_message, encode_message, lookup_via_exchange};

const MAX_TCP_MESSAGE_SIZE: usize = 65535;
const MAX_IDLE_TCP_CONNECTIONS: usize = 2;

pub struct TcpTransport {
    name: String,
    endpoint: ServerEndpoint,
    pool: Mutex<Vec<TcpStream>>,
    closed: AtomicBool,
}

impl TcpTransport {
    pub fn new(options: TransportOptions) -> Result<Self, DomainError> {
        Ok(Self {
            endpoint: ServerEndpoint::from_options(&options)?,
            name: options.name,
            pool: Mutex::new(Vec::new()),
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

    fn take_pooled(&self) -> Option<TcpStream> {
        self.pool
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop()
    }

    fn return_to_pool(&self, stream: TcpStream) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let mut pool = self
            .pool
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if pool.len() < MAX_IDLE_TCP_CONNECTIONS {
            pool.push(stream);
        }
    }

    pub fn idle_connections(&self) -> usize {
        self.pool
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    async fn connect_new(
        &self,
        server_addr: SocketAddr,
        timeout: Duration,
    ) -> Result<TcpStream, DomainError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(server_addr))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server_addr.to_string(),
            })?
            .map_err(|_| DomainError::TransportConnectionRefused {
                server: server_addr.to_string(),
            })?;

        stream.set_nodelay(true).map_err(|e| {
            DomainError::IoError(format!(
                "Failed to set TCP_NODELAY on {}: {}",
                server_addr, e
            ))
        })?;

        Ok(stream)
    }

    async fn send(&self, message_bytes: &[u8]) -> Result<Vec<u8>, DomainError> {
        let server_addr = self.endpoint.socket_addr().await?;
        let timeout = self.endpoint.timeout;

        // The server may have closed a pooled stream while it sat idle. That
        // surfaces as an I/O error on write or read, so one such failure gets
        // a second attempt on a fresh connection. Timeouts are not retried.
        if let Some(pooled) = self.take_pooled() {
            match self.round_trip(pooled, server_addr, message_bytes, timeout).await {
                Err(DomainError::IoError(e)) => {
                    debug!(server = %server_addr, error = %e, "Pooled TCP connection failed, reconnecting");
                }
                result => return result,
            }
        }

        let stream = self.connect_new(server_addr, timeout).await?;
        self.round_trip(stream, server_addr, message_bytes, timeout).await
    }

    async fn round_trip(
        &self,
        mut stream: TcpStream,
        server_addr: SocketAddr,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DomainError> {
        let timed_out = || DomainError::TransportTimeout {
            server: server_addr.to_string(),
        };

        tokio::time::timeout(timeout, send_with_length_prefix(&mut stream, message_bytes))
            .await
            .map_err(|_| timed_out())??;

        debug!(
            server = %server_addr,
            message_len = message_bytes.len(),
            "TCP query sent"
        );

        let response_bytes = tokio::time::timeout(timeout, read_with_length_prefix(&mut stream))
            .await
            .map_err(|_| timed_out())??;

        debug!(
            server = %server_addr,
            response_len = response_bytes.len(),
            "TCP response received"
        );

        self.return_to_pool(stream);
        Ok(response_bytes)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.endpoint.socket_addr().await.map(|_| ())
    }

    fn reset(&self) {
        self.pool
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.reset();
    }

    fn raw(&self) -> bool {
        true
    }

    async fn exchange(&self, _ctx: &QueryContext, message: &Message) -> Result<Message, DomainError> {
        self.ensure_open()?;
        let bytes = encode_message(message)?;
        let response = self.send(&bytes).await?;
        let response = decode_message(&response)?;
        if response.id() != message.id() {
            return Err(DomainError::InvalidDnsResponse(format!(
                "DNS ID mismatch from {}: expected {}, got {}",
                self.endpoint.server(),
                message.id(),
                response.id()
            )));
        }
        Ok(response)
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

pub(crate) async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> Result<(), DomainError>
where
    S: AsyncWriteExt + Unpin,
{
    if message_bytes.len() > MAX_TCP_MESSAGE_SIZE {
        return Err(DomainError::InvalidDnsResponse(format!(
            "Query too large for TCP framing: {} bytes",
            message_bytes.len()
        )));
    }
    let length_bytes = (message_bytes.len() as u16).to_be_bytes();

    stream
        .write_all(&length_bytes)
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to write length prefix: {}", e)))?;
    stream
        .write_all(message_bytes)
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to write DNS message: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to flush stream: {}", e)))?;

    Ok(())
}

pub(crate) async fn read_with_length_prefix<S>(stream: &mut S) -> Result<Vec<u8>, DomainError>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to read response length: {}", e)))?;

    let response_len = u16::from_be_bytes(len_buf) as usize;

    let mut response = vec![0u8; response_len];
    stream
        .read_exact(&mut response)
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to read response body: {}", e)))?;

    Ok(response)
}
