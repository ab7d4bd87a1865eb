#![allow(dead_code)]
use async_trait::async_trait;
use hickory_proto::op::Message;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use warden_dns_application::{QueryContext, Transport};
use warden_dns_domain::{DomainError, QueryOptions, Strategy};
use warden_dns_infrastructure::dns::Resolver;

use super::MessageBuilder;

type ExchangeFn = dyn Fn(&Message) -> Result<Message, DomainError> + Send + Sync;
type LookupFn = dyn Fn(&str, Strategy) -> Result<Vec<IpAddr>, DomainError> + Send + Sync;

/// Scriptable transport that counts every call it receives.
pub struct MockTransport {
    name: String,
    raw: bool,
    exchange_fn: Box<ExchangeFn>,
    lookup_fn: Box<LookupFn>,
    delay: Option<Duration>,
    pub exchanges: AtomicUsize,
    pub lookups: AtomicUsize,
    pub last_request: Mutex<Option<Message>>,
}

impl MockTransport {
    /// Raw transport answering A with `v4` and AAAA with `v6`.
    pub fn raw(name: &str, v4: &[&str], v6: &[&str], ttl: u32) -> Self {
        let addrs: Vec<IpAddr> = v4
            .iter()
            .chain(v6.iter())
            .map(|s| MessageBuilder::ip(s))
            .collect();
        Self::with_exchange(name, move |request| {
            Ok(MessageBuilder::answer(request, &addrs, ttl))
        })
    }

    pub fn with_exchange(
        name: &str,
        exchange: impl Fn(&Message) -> Result<Message, DomainError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            raw: true,
            exchange_fn: Box::new(exchange),
            lookup_fn: Box::new(|_, _| Err(DomainError::RawUnsupported("mock".into()))),
            delay: None,
            exchanges: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Address-only transport returning `addrs` filtered by strategy.
    pub fn native(name: &str, addrs: &[&str]) -> Self {
        let addrs: Vec<IpAddr> = addrs.iter().map(|s| MessageBuilder::ip(s)).collect();
        Self::with_lookup(name, move |_, strategy| {
            Ok(addrs
                .iter()
                .copied()
                .filter(|addr| strategy.accepts(addr))
                .collect())
        })
    }

    pub fn with_lookup(
        name: &str,
        lookup: impl Fn(&str, Strategy) -> Result<Vec<IpAddr>, DomainError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            raw: false,
            exchange_fn: Box::new(|_| Err(DomainError::RawUnsupported("mock".into()))),
            lookup_fn: Box::new(lookup),
            delay: None,
            exchanges: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<Message> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&self) {}

    fn raw(&self) -> bool {
        self.raw
    }

    async fn exchange(&self, _ctx: &QueryContext, message: &Message) -> Result<Message, DomainError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(message.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.exchange_fn)(message)
    }

    async fn lookup(
        &self,
        _ctx: &QueryContext,
        domain: &str,
        strategy: Strategy,
    ) -> Result<Vec<IpAddr>, DomainError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.lookup_fn)(domain, strategy)
    }
}

/// Raw transport whose every exchange goes back through the resolver with
/// itself as the transport, the way a DNS server configured by hostname
/// would resolve its own name.
pub struct LoopingTransport {
    pub name: String,
    pub resolver: Arc<Resolver>,
    pub exchanges: AtomicUsize,
}

#[async_trait]
impl Transport for LoopingTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&self) {}

    fn raw(&self) -> bool {
        true
    }

    async fn exchange(&self, ctx: &QueryContext, message: &Message) -> Result<Message, DomainError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        let options = QueryOptions::default().with_cache_disabled();
        self.resolver.exchange(ctx, self, message, &options).await
    }

    async fn lookup(
        &self,
        ctx: &QueryContext,
        domain: &str,
        strategy: Strategy,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let options = QueryOptions::default().with_strategy(strategy);
        self.resolver.lookup(ctx, self, domain, &options).await
    }
}
