use hickory_proto::op::{Message, Query, ResponseCode};
use hickory_proto::rr::RecordType;
use std::borrow::Cow;
use std::future::Future;
use std::net::IpAddr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use warden_dns_application::{QueryContext, RdrcFactory, RdrcStore, ResponseChecker, Transport};
use warden_dns_domain::{
    DomainError, QueryOptions, Question, RCodeError, Rejection, Strategy,
};

use super::builder::ResolverBuilder;
use super::log::{log_cached_response, log_exchange_response, log_reject_response};
use super::response::{
    empty_response, filter_https_hints, fixed_response, message_to_addrs, normalize_ttl,
    set_message_id, DEFAULT_TTL,
};
use crate::dns::cache::{CacheKey, CacheMode, MessageCache};
use crate::dns::edns::set_client_subnet;

/// Cache-aware DNS resolver in front of any number of transports.
///
/// The resolver keeps no per-call state; the cache and the rejected-response
/// store are the only shared mutable parts and both are safe to use
/// concurrently.
pub struct Resolver {
    pub(super) timeout: Duration,
    pub(super) disable_cache: bool,
    pub(super) cache: MessageCache,
    pub(super) cache_mode: CacheMode,
    pub(super) rdrc_factory: Option<RdrcFactory>,
    pub(super) rdrc: OnceLock<Arc<dyn RdrcStore>>,
}

impl Resolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    /// Initialises the rejected-response store from its factory, once.
    pub fn start(&self) {
        if let Some(factory) = &self.rdrc_factory {
            self.rdrc.get_or_init(|| {
                info!("Rejected-response cache initialized");
                factory()
            });
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(super) fn rdrc(&self) -> Option<&Arc<dyn RdrcStore>> {
        self.rdrc.get()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub(super) fn cache_key(&self, question: &Question, transport: &dyn Transport) -> CacheKey {
        self.cache_mode.key(question.clone(), transport.name())
    }

    pub(super) fn load_response(
        &self,
        question: &Question,
        transport: &dyn Transport,
    ) -> Option<(Message, u32)> {
        self.cache
            .load(&self.cache_key(question, transport), Instant::now())
    }

    pub(super) fn store_cache(
        &self,
        question: &Question,
        transport: &dyn Transport,
        message: Message,
        ttl: u32,
    ) {
        self.cache.store(
            self.cache_key(question, transport),
            message,
            ttl,
            Instant::now(),
        );
    }

    /// Addresses of a cached answer. `NotCached` on a miss, the response code
    /// when the cached answer is not a success.
    pub(super) fn question_cache(
        &self,
        question: &Question,
        transport: &dyn Transport,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let (response, _) = self
            .load_response(question, transport)
            .ok_or(DomainError::NotCached)?;
        let rcode = RCodeError::from(response.response_code());
        if rcode != RCodeError::SUCCESS {
            return Err(rcode.into());
        }
        Ok(message_to_addrs(&response))
    }

    /// Runs `operation` under the resolver timeout, aborting early when the
    /// caller's context is cancelled.
    pub(super) async fn with_deadline<T>(
        &self,
        ctx: &QueryContext,
        operation: impl Future<Output = Result<T, DomainError>>,
    ) -> Result<T, DomainError> {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(DomainError::Cancelled),
            result = tokio::time::timeout(self.timeout, operation) => match result {
                Ok(result) => result,
                Err(_) => Err(DomainError::QueryTimeout),
            },
        }
    }

    pub async fn exchange(
        &self,
        ctx: &QueryContext,
        transport: &dyn Transport,
        message: &Message,
        options: &QueryOptions,
    ) -> Result<Message, DomainError> {
        self.exchange_inner(ctx, transport, message, options, None)
            .await
    }

    /// Like [`Resolver::exchange`], rejecting answers whose code is neither
    /// success nor NXDOMAIN or whose addresses `checker` refuses. The rejected
    /// response is carried by [`DomainError::ResponseRejected`].
    pub async fn exchange_with_response_check(
        &self,
        ctx: &QueryContext,
        transport: &dyn Transport,
        message: &Message,
        options: &QueryOptions,
        checker: &ResponseChecker,
    ) -> Result<Message, DomainError> {
        self.exchange_inner(ctx, transport, message, options, Some(checker))
            .await
    }

    pub(super) async fn exchange_inner(
        &self,
        ctx: &QueryContext,
        transport: &dyn Transport,
        message: &Message,
        options: &QueryOptions,
        checker: Option<&ResponseChecker>,
    ) -> Result<Message, DomainError> {
        let Some(query) = message.queries().first().cloned() else {
            warn!(transport = transport.name(), "DNS message has no question");
            return Ok(empty_response(message, ResponseCode::FormErr));
        };
        let question = Question::from_query(&query);
        let query_type = question.query_type();

        let message: Cow<'_, Message> = match options.client_subnet {
            Some(subnet) => set_client_subnet(message, subnet, true),
            None => Cow::Borrowed(message),
        };

        let is_simple_request = message.queries().len() == 1
            && message.name_servers().is_empty()
            && message.additionals().is_empty()
            && message.extensions().is_none()
            && options.client_subnet.is_none();
        let disable_cache = !is_simple_request || self.disable_cache || options.disable_cache;

        if !disable_cache {
            if let Some((mut response, ttl)) = self.load_response(&question, transport) {
                log_cached_response(&response, ttl);
                set_message_id(&mut response, message.id());
                return Ok(response);
            }
        }

        if excluded_by_strategy(query_type, options.strategy) {
            debug!(
                question = %question,
                strategy = %options.strategy,
                "strategy rejected"
            );
            return Ok(fixed_response(message.id(), &query, &[], 0));
        }

        if !transport.raw() {
            if matches!(query_type, RecordType::A | RecordType::AAAA) {
                return self
                    .exchange_to_lookup(ctx, transport, &message, &query, options, checker)
                    .await;
            }
            return Err(DomainError::RawUnsupported(transport.name().to_string()));
        }

        if ctx.contains_transport(transport.name()) {
            debug!(transport = transport.name(), "DNS query loopback");
            return Err(DomainError::Loopback(transport.name().to_string()));
        }
        let ctx = ctx.with_transport(transport.name());

        if checker.is_some() {
            if let Some(rdrc) = self.rdrc() {
                if rdrc.load(transport.name(), question.name(), query_type) {
                    return Err(DomainError::ResponseRejectedCached);
                }
            }
        }

        let mut response = self
            .with_deadline(&ctx, transport.exchange(&ctx, &message))
            .await?;
        set_message_id(&mut response, message.id());

        if let Some(checker) = checker {
            let rcode = response.response_code();
            let rejected = if rcode != ResponseCode::NoError && rcode != ResponseCode::NXDomain {
                true
            } else {
                !checker(&message_to_addrs(&response))
            };
            if rejected {
                if let Some(rdrc) = self.rdrc() {
                    rdrc.save_async(transport.name(), question.name(), query_type);
                }
                log_reject_response(&response);
                return Err(DomainError::ResponseRejected(Rejection::Response(
                    Box::new(response),
                )));
            }
        }

        if query_type == RecordType::HTTPS {
            filter_https_hints(&mut response, options.strategy);
        }

        let ttl = normalize_ttl(&mut response, options.ttl.map(|ttl| ttl.rewrite));
        if !disable_cache {
            self.store_cache(&question, transport, response.clone(), ttl);
        }
        log_exchange_response(&response, ttl);
        Ok(response)
    }

    /// Answers an A or AAAA exchange on an address-only transport with a
    /// synthesised response.
    async fn exchange_to_lookup(
        &self,
        ctx: &QueryContext,
        transport: &dyn Transport,
        message: &Message,
        query: &Query,
        options: &QueryOptions,
        checker: Option<&ResponseChecker>,
    ) -> Result<Message, DomainError> {
        let strategy = if query.query_type() == RecordType::A {
            Strategy::OnlyIpv4
        } else {
            Strategy::OnlyIpv6
        };
        let options = options.clone().with_strategy(strategy);
        let ttl = options.ttl.map_or(DEFAULT_TTL, |ttl| ttl.rewrite);
        let domain = query.name().to_ascii();

        match self
            .lookup_native(ctx, transport, &domain, &options, checker)
            .await
        {
            Ok(addrs) => {
                let response = fixed_response(message.id(), query, &addrs, ttl);
                log_exchange_response(&response, ttl);
                Ok(response)
            }
            Err(DomainError::ResponseRejected(Rejection::Addresses(addrs))) => {
                Err(DomainError::ResponseRejected(Rejection::Response(Box::new(
                    fixed_response(message.id(), query, &addrs, ttl),
                ))))
            }
            Err(e) => Err(e),
        }
    }
}

fn excluded_by_strategy(query_type: RecordType, strategy: Strategy) -> bool {
    (query_type == RecordType::A && strategy == Strategy::OnlyIpv6)
        || (query_type == RecordType::AAAA && strategy == Strategy::OnlyIpv4)
}
