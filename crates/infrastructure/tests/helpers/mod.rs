#![allow(dead_code)]
pub mod builders;
pub mod dns_server_mock;
pub mod mock_transport;

pub use builders::MessageBuilder;
pub use dns_server_mock::{MockDnsServer, MockTcpDnsServer};
pub use mock_transport::{LoopingTransport, MockTransport};
