//! Warden DNS Application Layer: the contracts the resolver is written against.
pub mod context;
pub mod ports;

pub use context::QueryContext;
pub use ports::{
    RdrcFactory, RdrcStore, ResponseChecker, ServerResolver, Transport, TransportConstructor,
    TransportOptions,
};
