pub mod cache;
pub mod edns;
pub mod rdrc;
pub mod resolver;
pub mod transport;

pub use cache::{CacheKey, CacheMode, MessageCache};
pub use edns::{apply_client_subnet, set_client_subnet};
pub use rdrc::MemoryRdrcStore;
pub use resolver::{Resolver, ResolverBuilder, TransportServerResolver};
pub use transport::{create_transport, register_transport, TransportRegistry};
