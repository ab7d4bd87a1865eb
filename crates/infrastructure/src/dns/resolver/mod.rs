pub mod builder;
pub mod core;
pub mod log;
pub mod lookup;
pub mod response;
pub mod server;

pub use builder::ResolverBuilder;
pub use self::core::Resolver;
pub use log::format_record;
pub use response::{
    empty_response, filter_https_hints, fixed_response, message_to_addrs, normalize_ttl,
    sort_addrs, DEFAULT_TTL,
};
pub use server::TransportServerResolver;
