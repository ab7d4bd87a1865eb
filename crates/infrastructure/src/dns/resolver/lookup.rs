use hickory_proto::op::{Message, MessageType, OpCode};
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use warden_dns_application::{QueryContext, ResponseChecker, Transport};
use warden_dns_domain::{
    fqdn_to_domain, to_fqdn, DomainError, QueryOptions, Question, RCodeError, Rejection, Strategy,
};

use super::core::Resolver;
use super::log::log_reject_response;
use super::response::{fixed_response, message_to_addrs, sort_addrs, DEFAULT_TTL};

impl Resolver {
    pub async fn lookup(
        &self,
        ctx: &QueryContext,
        transport: &dyn Transport,
        domain: &str,
        options: &QueryOptions,
    ) -> Result<Vec<IpAddr>, DomainError> {
        self.lookup_inner(ctx, transport, domain, options, None)
            .await
    }

    /// Like [`Resolver::lookup`]; a refused address list is carried by
    /// [`DomainError::ResponseRejected`].
    pub async fn lookup_with_response_check(
        &self,
        ctx: &QueryContext,
        transport: &dyn Transport,
        domain: &str,
        options: &QueryOptions,
        checker: &ResponseChecker,
    ) -> Result<Vec<IpAddr>, DomainError> {
        self.lookup_inner(ctx, transport, domain, options, Some(checker))
            .await
    }

    async fn lookup_inner(
        &self,
        ctx: &QueryContext,
        transport: &dyn Transport,
        domain: &str,
        options: &QueryOptions,
        checker: Option<&ResponseChecker>,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let domain = fqdn_to_domain(domain);
        if !transport.raw() {
            return self
                .lookup_native(ctx, transport, domain, options, checker)
                .await;
        }

        let fqdn = to_fqdn(domain);
        match options.strategy {
            Strategy::OnlyIpv4 => {
                return self
                    .lookup_to_exchange(ctx, transport, &fqdn, RecordType::A, options, checker)
                    .await
            }
            Strategy::OnlyIpv6 => {
                return self
                    .lookup_to_exchange(ctx, transport, &fqdn, RecordType::AAAA, options, checker)
                    .await
            }
            _ => {}
        }

        // Both families share one child context so a caller cancellation
        // reaches both, while neither family's failure cancels the other.
        let group = ctx.child();
        let (result4, result6) = tokio::join!(
            self.lookup_to_exchange(&group, transport, &fqdn, RecordType::A, options, checker),
            self.lookup_to_exchange(&group, transport, &fqdn, RecordType::AAAA, options, checker),
        );

        let (addrs4, err4) = split_result(result4);
        let (addrs6, err6) = split_result(result6);
        if addrs4.is_empty() && addrs6.is_empty() {
            return match err4.or(err6) {
                Some(e) => Err(e),
                None => Ok(Vec::new()),
            };
        }
        Ok(sort_addrs(addrs4, addrs6, options.strategy))
    }

    async fn lookup_to_exchange(
        &self,
        ctx: &QueryContext,
        transport: &dyn Transport,
        fqdn: &str,
        query_type: RecordType,
        options: &QueryOptions,
        checker: Option<&ResponseChecker>,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let question = Question::internet(fqdn, query_type);

        if !(self.disable_cache || options.disable_cache) {
            match self.question_cache(&question, transport) {
                Err(DomainError::NotCached) => {}
                cached => return cached,
            }
        }

        let mut message = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(question.to_query()?);

        let response = self
            .exchange_inner(ctx, transport, &message, options, checker)
            .await?;
        let rcode = RCodeError::from(response.response_code());
        if rcode != RCodeError::SUCCESS {
            return Err(rcode.into());
        }
        Ok(message_to_addrs(&response))
    }

    /// Address lookup on a transport that cannot exchange raw messages.
    pub(super) async fn lookup_native(
        &self,
        ctx: &QueryContext,
        transport: &dyn Transport,
        domain: &str,
        options: &QueryOptions,
        checker: Option<&ResponseChecker>,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let domain = fqdn_to_domain(domain);
        let fqdn = to_fqdn(domain);
        let strategy = options.strategy;
        let question4 = Question::internet(&fqdn, RecordType::A);
        let question6 = Question::internet(&fqdn, RecordType::AAAA);
        let disable_cache = self.disable_cache || options.disable_cache;

        if !disable_cache {
            match strategy {
                Strategy::OnlyIpv4 => match self.question_cache(&question4, transport) {
                    Err(DomainError::NotCached) => {}
                    cached => return cached,
                },
                Strategy::OnlyIpv6 => match self.question_cache(&question6, transport) {
                    Err(DomainError::NotCached) => {}
                    cached => return cached,
                },
                _ => {
                    let addrs4 = self
                        .question_cache(&question4, transport)
                        .unwrap_or_default();
                    let addrs6 = self
                        .question_cache(&question6, transport)
                        .unwrap_or_default();
                    if !addrs4.is_empty() || !addrs6.is_empty() {
                        return Ok(sort_addrs(addrs4, addrs6, strategy));
                    }
                }
            }
        }

        if checker.is_some() {
            if let Some(rdrc) = self.rdrc() {
                let rejected = (strategy != Strategy::OnlyIpv6
                    && rdrc.load(transport.name(), &fqdn, RecordType::A))
                    || (strategy != Strategy::OnlyIpv4
                        && rdrc.load(transport.name(), &fqdn, RecordType::AAAA));
                if rejected {
                    return Err(DomainError::ResponseRejectedCached);
                }
            }
        }

        let addrs = self
            .with_deadline(ctx, transport.lookup(ctx, domain, strategy))
            .await?;

        if let Some(checker) = checker {
            if !checker(&addrs) {
                if let Some(rdrc) = self.rdrc() {
                    if addrs.iter().any(|addr| is_ipv4(addr)) {
                        rdrc.save_async(transport.name(), &fqdn, RecordType::A);
                    }
                    if addrs.iter().any(|addr| !is_ipv4(addr)) {
                        rdrc.save_async(transport.name(), &fqdn, RecordType::AAAA);
                    }
                }
                if let Ok(query) = question4.to_query() {
                    log_reject_response(&fixed_response(0, &query, &addrs, DEFAULT_TTL));
                }
                return Err(DomainError::ResponseRejected(Rejection::Addresses(addrs)));
            }
        }

        if !disable_cache {
            let ttl = options.ttl.map_or(DEFAULT_TTL, |ttl| ttl.rewrite);
            if strategy != Strategy::OnlyIpv6 {
                let addrs4: Vec<IpAddr> = addrs
                    .iter()
                    .filter_map(|addr| as_ipv4(addr).map(IpAddr::V4))
                    .collect();
                self.store_family(&question4, transport, &addrs4, ttl)?;
            }
            if strategy != Strategy::OnlyIpv4 {
                let addrs6: Vec<IpAddr> = addrs
                    .iter()
                    .filter(|addr| !is_ipv4(addr))
                    .copied()
                    .collect();
                self.store_family(&question6, transport, &addrs6, ttl)?;
            }
        }

        Ok(addrs)
    }

    fn store_family(
        &self,
        question: &Question,
        transport: &dyn Transport,
        addrs: &[IpAddr],
        ttl: u32,
    ) -> Result<(), DomainError> {
        let response = fixed_response(0, &question.to_query()?, addrs, ttl);
        self.store_cache(question, transport, response, ttl);
        Ok(())
    }
}

fn split_result(result: Result<Vec<IpAddr>, DomainError>) -> (Vec<IpAddr>, Option<DomainError>) {
    match result {
        Ok(addrs) => (addrs, None),
        Err(e) => (Vec::new(), Some(e)),
    }
}

/// IPv4, including IPv4-mapped IPv6.
fn as_ipv4(addr: &IpAddr) -> Option<std::net::Ipv4Addr> {
    match addr {
        IpAddr::V4(v4) => Some(*v4),
        IpAddr::V6(v6) => v6.to_ipv4_mapped(),
    }
}

fn is_ipv4(addr: &IpAddr) -> bool {
    as_ipv4(addr).is_some()
}
