use dashmap::DashMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;
use warden_dns_application::{Transport, TransportConstructor, TransportOptions};
use warden_dns_domain::{address_scheme, DomainError};

use super::local::{LocalTransport, LOCAL_ADDRESS};
use super::subnet::ClientSubnetTransport;
use super::tcp::TcpTransport;
use super::udp::UdpTransport;

static GLOBAL_REGISTRY: LazyLock<TransportRegistry> = LazyLock::new(TransportRegistry::with_defaults);

/// Maps scheme strings (or exact addresses such as `local`) to transport
/// constructors. Registering a scheme again replaces the earlier constructor.
pub struct TransportRegistry {
    constructors: DashMap<String, TransportConstructor>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self {
            constructors: DashMap::new(),
        }
    }

    /// Registry with `udp` (also the bare `host[:port]` form), `tcp` and `local`.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(&["udp", ""], Arc::new(UdpTransport::constructor));
        registry.register(&["tcp"], Arc::new(TcpTransport::constructor));
        registry.register(&[LOCAL_ADDRESS], Arc::new(LocalTransport::constructor));
        registry
    }

    pub fn register(&self, schemes: &[&str], constructor: TransportConstructor) {
        for scheme in schemes {
            self.constructors
                .insert((*scheme).to_string(), Arc::clone(&constructor));
        }
    }

    /// Looks up a constructor by exact address, then by URL scheme.
    pub fn constructor_for(&self, address: &str) -> Option<TransportConstructor> {
        if let Some(constructor) = self.constructors.get(address) {
            return Some(Arc::clone(constructor.value()));
        }
        self.constructors
            .get(address_scheme(address))
            .map(|constructor| Arc::clone(constructor.value()))
    }

    /// Builds a transport, wrapping it in a [`ClientSubnetTransport`] when
    /// the options carry a client subnet.
    pub fn create(&self, mut options: TransportOptions) -> Result<Arc<dyn Transport>, DomainError> {
        let constructor = self
            .constructor_for(&options.address)
            .ok_or_else(|| DomainError::UnknownTransportFormat(options.address.clone()))?;

        options.context = options.context.with_transport(&options.name);
        let client_subnet = options.client_subnet;
        let name = options.name.clone();
        let address = options.address.clone();

        let transport = constructor(options)?;
        debug!(transport = %name, address = %address, "Created DNS transport");

        Ok(match client_subnet {
            Some(subnet) => Arc::new(ClientSubnetTransport::new(transport, subnet)),
            None => transport,
        })
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

pub fn register_transport(schemes: &[&str], constructor: TransportConstructor) {
    GLOBAL_REGISTRY.register(schemes, constructor);
}

pub fn create_transport(options: TransportOptions) -> Result<Arc<dyn Transport>, DomainError> {
    GLOBAL_REGISTRY.create(options)
}
