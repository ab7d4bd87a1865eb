mod rdrc_store;
mod server_resolver;
mod transport;

pub use rdrc_store::{RdrcFactory, RdrcStore};
pub use server_resolver::ServerResolver;
pub use transport::{ResponseChecker, Transport, TransportConstructor, TransportOptions};
