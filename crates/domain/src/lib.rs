//! Warden DNS Domain Layer
pub mod config;
pub mod errors;
pub mod query_options;
pub mod question;
pub mod rcode;
pub mod strategy;
pub mod upstream;

pub use config::{CliOverrides, Config, ConfigError, LoggingConfig, ResolverConfig, UpstreamConfig};
pub use errors::{DomainError, Rejection};
pub use query_options::{QueryOptions, TtlOptions};
pub use question::{fqdn_to_domain, to_fqdn, Question};
pub use rcode::RCodeError;
pub use strategy::Strategy;
pub use upstream::{address_scheme, UpstreamAddr};
