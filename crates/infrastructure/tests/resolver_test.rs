use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use warden_dns_application::{QueryContext, RdrcFactory, RdrcStore};
use warden_dns_domain::{DomainError, QueryOptions, RCodeError, Strategy};
use warden_dns_infrastructure::dns::{MemoryRdrcStore, Resolver};

mod helpers;
use helpers::{LoopingTransport, MessageBuilder, MockTransport};

fn resolver() -> Resolver {
    Resolver::builder().build()
}

fn resolver_with_rdrc() -> (Resolver, MemoryRdrcStore) {
    let store = MemoryRdrcStore::default();
    let shared = store.clone();
    let factory: RdrcFactory = Arc::new(move || Arc::new(shared.clone()) as Arc<dyn RdrcStore>);
    let resolver = Resolver::builder().with_rdrc(factory).build();
    resolver.start();
    (resolver, store)
}

#[test]
fn test_start_builds_rejected_response_store_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let factory: RdrcFactory = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(MemoryRdrcStore::default()) as Arc<dyn RdrcStore>
    });
    let resolver = Resolver::builder().with_rdrc(factory).build();

    resolver.start();
    resolver.start();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

fn reject_all(_: &[IpAddr]) -> bool {
    false
}

async fn wait_for_rdrc(store: &MemoryRdrcStore) {
    for _ in 0..100 {
        if !store.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("rejected response was never recorded");
}

#[tokio::test]
async fn test_exchange_without_question_returns_format_error() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &[], 60);
    let message = MessageBuilder::empty();

    let response = resolver
        .exchange(&QueryContext::new(), &transport, &message, &QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(response.response_code(), ResponseCode::FormErr);
    assert_eq!(response.id(), message.id());
    assert_eq!(transport.exchange_count(), 0);
}

#[tokio::test]
async fn test_exchange_serves_second_query_from_cache() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &[], 60);
    let ctx = QueryContext::new();
    let options = QueryOptions::default();

    let first = MessageBuilder::query("example.com.", RecordType::A);
    resolver.exchange(&ctx, &transport, &first, &options).await.unwrap();

    let second = MessageBuilder::query("EXAMPLE.com.", RecordType::A);
    let cached = resolver
        .exchange(&ctx, &transport, &second, &options)
        .await
        .unwrap();

    assert_eq!(transport.exchange_count(), 1);
    assert_eq!(cached.id(), second.id());
    assert_eq!(cached.answers().len(), 1);
    assert!(cached.answers()[0].ttl() <= 60);
}

#[tokio::test]
async fn test_exchange_cache_bypassed_when_disabled_per_query() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &[], 60);
    let ctx = QueryContext::new();
    let options = QueryOptions::default().with_cache_disabled();

    for _ in 0..2 {
        let message = MessageBuilder::query("example.com.", RecordType::A);
        resolver.exchange(&ctx, &transport, &message, &options).await.unwrap();
    }

    assert_eq!(transport.exchange_count(), 2);
}

#[tokio::test]
async fn test_exchange_cache_disabled_on_resolver() {
    let resolver = Resolver::builder().with_cache_disabled().build();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &[], 60);
    let ctx = QueryContext::new();

    for _ in 0..2 {
        let message = MessageBuilder::query("example.com.", RecordType::A);
        resolver
            .exchange(&ctx, &transport, &message, &QueryOptions::default())
            .await
            .unwrap();
    }

    assert_eq!(transport.exchange_count(), 2);
}

#[tokio::test]
async fn test_exchange_zero_ttl_answer_is_not_cached() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &[], 0);
    let ctx = QueryContext::new();

    for _ in 0..2 {
        let message = MessageBuilder::query("example.com.", RecordType::A);
        resolver
            .exchange(&ctx, &transport, &message, &QueryOptions::default())
            .await
            .unwrap();
    }

    assert_eq!(transport.exchange_count(), 2);
}

#[tokio::test]
async fn test_exchange_ttl_rewrite_applies_to_all_records() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1", "192.0.2.2"], &[], 60);
    let message = MessageBuilder::query("example.com.", RecordType::A);

    let response = resolver
        .exchange(
            &QueryContext::new(),
            &transport,
            &message,
            &QueryOptions::default().with_ttl_rewrite(5),
        )
        .await
        .unwrap();

    assert_eq!(response.answers().len(), 2);
    assert!(response.answers().iter().all(|record| record.ttl() == 5));
}

#[tokio::test]
async fn test_per_transport_cache_is_isolated() {
    let resolver = resolver();
    let first = MockTransport::raw("first", &["192.0.2.1"], &[], 60);
    let second = MockTransport::raw("second", &["192.0.2.2"], &[], 60);
    let ctx = QueryContext::new();
    let options = QueryOptions::default();

    resolver
        .exchange(&ctx, &first, &MessageBuilder::query("example.com.", RecordType::A), &options)
        .await
        .unwrap();
    resolver
        .exchange(&ctx, &second, &MessageBuilder::query("example.com.", RecordType::A), &options)
        .await
        .unwrap();

    assert_eq!(first.exchange_count(), 1);
    assert_eq!(second.exchange_count(), 1);
}

#[tokio::test]
async fn test_shared_cache_spans_transports() {
    let resolver = Resolver::builder().with_shared_cache().build();
    let first = MockTransport::raw("first", &["192.0.2.1"], &[], 60);
    let second = MockTransport::raw("second", &["192.0.2.2"], &[], 60);
    let ctx = QueryContext::new();
    let options = QueryOptions::default();

    resolver
        .exchange(&ctx, &first, &MessageBuilder::query("example.com.", RecordType::A), &options)
        .await
        .unwrap();
    let response = resolver
        .exchange(&ctx, &second, &MessageBuilder::query("example.com.", RecordType::A), &options)
        .await
        .unwrap();

    assert_eq!(second.exchange_count(), 0);
    assert_eq!(
        MessageBuilder::first_ip(&response),
        Some(MessageBuilder::ip("192.0.2.1"))
    );
}

#[tokio::test]
async fn test_clear_cache_forces_new_exchange() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &[], 60);
    let ctx = QueryContext::new();
    let options = QueryOptions::default();

    resolver
        .exchange(&ctx, &transport, &MessageBuilder::query("example.com.", RecordType::A), &options)
        .await
        .unwrap();
    resolver.clear_cache();
    resolver
        .exchange(&ctx, &transport, &MessageBuilder::query("example.com.", RecordType::A), &options)
        .await
        .unwrap();

    assert_eq!(transport.exchange_count(), 2);
}

#[tokio::test]
async fn test_strategy_excluded_family_answers_empty_success() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &["2001:db8::1"], 60);
    let message = MessageBuilder::query("example.com.", RecordType::AAAA);

    let response = resolver
        .exchange(
            &QueryContext::new(),
            &transport,
            &message,
            &QueryOptions::default().with_strategy(Strategy::OnlyIpv4),
        )
        .await
        .unwrap();

    assert_eq!(response.response_code(), ResponseCode::NoError);
    assert!(response.answers().is_empty());
    assert_eq!(response.id(), message.id());
    assert_eq!(transport.exchange_count(), 0);
}

#[tokio::test]
async fn test_client_subnet_request_reaches_transport_and_skips_cache() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &[], 60);
    let ctx = QueryContext::new();
    let options = QueryOptions::default().with_client_subnet("198.51.100.0/24".parse().unwrap());

    for _ in 0..2 {
        let message = MessageBuilder::query("example.com.", RecordType::A);
        resolver.exchange(&ctx, &transport, &message, &options).await.unwrap();
    }

    assert_eq!(transport.exchange_count(), 2);
    let sent = transport.last_request().unwrap();
    assert!(sent.extensions().is_some());
}

#[tokio::test]
async fn test_exchange_detects_loopback() {
    let resolver = Arc::new(resolver());
    let transport = LoopingTransport {
        name: "self-referencing".to_string(),
        resolver: Arc::clone(&resolver),
        exchanges: Default::default(),
    };
    let message = MessageBuilder::query("dns.example.", RecordType::A);

    let result = resolver
        .exchange(&QueryContext::new(), &transport, &message, &QueryOptions::default())
        .await;

    assert!(matches!(result, Err(DomainError::Loopback(name)) if name == "self-referencing"));
    assert_eq!(
        transport.exchanges.load(Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn test_loopback_check_uses_whole_chain() {
    let resolver = resolver();
    let transport = MockTransport::raw("outer", &["192.0.2.1"], &[], 60);
    let ctx = QueryContext::new().with_transport("outer").with_transport("inner");
    let message = MessageBuilder::query("example.com.", RecordType::A);

    let result = resolver
        .exchange(&ctx, &transport, &message, &QueryOptions::default())
        .await;

    assert!(matches!(result, Err(DomainError::Loopback(_))));
    assert_eq!(transport.exchange_count(), 0);
}

#[tokio::test]
async fn test_response_check_rejects_and_remembers() {
    let (resolver, store) = resolver_with_rdrc();
    let transport = MockTransport::raw("upstream", &["10.0.0.1"], &[], 60);
    let ctx = QueryContext::new();
    let options = QueryOptions::default();

    let first = resolver
        .exchange_with_response_check(
            &ctx,
            &transport,
            &MessageBuilder::query("example.com.", RecordType::A),
            &options,
            &reject_all,
        )
        .await;
    match first {
        Err(DomainError::ResponseRejected(rejection)) => {
            assert_eq!(rejection.response().unwrap().answers().len(), 1);
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    wait_for_rdrc(&store).await;

    let second = resolver
        .exchange_with_response_check(
            &ctx,
            &transport,
            &MessageBuilder::query("example.com.", RecordType::A),
            &options,
            &reject_all,
        )
        .await;
    assert!(matches!(second, Err(DomainError::ResponseRejectedCached)));
    assert_eq!(transport.exchange_count(), 1);
}

#[tokio::test]
async fn test_response_check_rejects_server_failure() {
    let resolver = resolver();
    let transport = MockTransport::with_exchange("upstream", |request| {
        Ok(MessageBuilder::rcode(request, ResponseCode::ServFail))
    });

    let result = resolver
        .exchange_with_response_check(
            &QueryContext::new(),
            &transport,
            &MessageBuilder::query("example.com.", RecordType::A),
            &QueryOptions::default(),
            &|_: &[IpAddr]| true,
        )
        .await;

    assert!(matches!(result, Err(DomainError::ResponseRejected(_))));
}

#[tokio::test]
async fn test_response_check_accepts_nxdomain() {
    let resolver = resolver();
    let transport = MockTransport::with_exchange("upstream", |request| {
        Ok(MessageBuilder::rcode(request, ResponseCode::NXDomain))
    });

    let response = resolver
        .exchange_with_response_check(
            &QueryContext::new(),
            &transport,
            &MessageBuilder::query("missing.example.", RecordType::A),
            &QueryOptions::default(),
            &|_: &[IpAddr]| true,
        )
        .await
        .unwrap();

    assert_eq!(response.response_code(), ResponseCode::NXDomain);
}

#[tokio::test]
async fn test_rdrc_ignored_without_response_check() {
    let (resolver, store) = resolver_with_rdrc();
    let transport = MockTransport::raw("upstream", &["10.0.0.1"], &[], 60);
    store.save("upstream", "example.com.", RecordType::A).await.unwrap();

    let response = resolver
        .exchange(
            &QueryContext::new(),
            &transport,
            &MessageBuilder::query("example.com.", RecordType::A),
            &QueryOptions::default().with_cache_disabled(),
        )
        .await
        .unwrap();

    assert_eq!(response.answers().len(), 1);
    assert_eq!(transport.exchange_count(), 1);
}

#[tokio::test]
async fn test_non_raw_transport_answers_address_exchange() {
    let resolver = resolver();
    let transport = MockTransport::native("hosts", &["192.0.2.7", "2001:db8::7"]);
    let message = MessageBuilder::query("host.example.", RecordType::A);

    let response = resolver
        .exchange(&QueryContext::new(), &transport, &message, &QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(response.id(), message.id());
    assert_eq!(response.response_code(), ResponseCode::NoError);
    assert_eq!(response.answers().len(), 1);
    assert_eq!(response.answers()[0].ttl(), 600);
    assert_eq!(
        MessageBuilder::first_ip(&response),
        Some(MessageBuilder::ip("192.0.2.7"))
    );
}

#[tokio::test]
async fn test_non_raw_transport_refuses_other_types() {
    let resolver = resolver();
    let transport = MockTransport::native("hosts", &["192.0.2.7"]);

    let result = resolver
        .exchange(
            &QueryContext::new(),
            &transport,
            &MessageBuilder::query("host.example.", RecordType::MX),
            &QueryOptions::default(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::RawUnsupported(_))));
    assert_eq!(transport.lookup_count(), 0);
}

#[tokio::test]
async fn test_non_raw_rejection_carries_synthesised_response() {
    let resolver = resolver();
    let transport = MockTransport::native("hosts", &["10.0.0.9"]);

    let result = resolver
        .exchange_with_response_check(
            &QueryContext::new(),
            &transport,
            &MessageBuilder::query("host.example.", RecordType::A),
            &QueryOptions::default(),
            &reject_all,
        )
        .await;

    let err = result.unwrap_err();
    let response = err.rejected_response().unwrap();
    assert_eq!(response.answers().len(), 1);
}

#[tokio::test]
async fn test_lookup_joins_both_families_in_strategy_order() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &["2001:db8::1"], 60);
    let ctx = QueryContext::new();

    let as_is = resolver
        .lookup(&ctx, &transport, "example.com", &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(
        as_is,
        vec![MessageBuilder::ip("192.0.2.1"), MessageBuilder::ip("2001:db8::1")]
    );

    let prefer_v6 = resolver
        .lookup(
            &ctx,
            &transport,
            "example.com.",
            &QueryOptions::default().with_strategy(Strategy::PreferIpv6),
        )
        .await
        .unwrap();
    assert_eq!(
        prefer_v6,
        vec![MessageBuilder::ip("2001:db8::1"), MessageBuilder::ip("192.0.2.1")]
    );

    assert_eq!(transport.exchange_count(), 2);
}

#[tokio::test]
async fn test_lookup_single_family_queries_once() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &["2001:db8::1"], 60);

    let addrs = resolver
        .lookup(
            &QueryContext::new(),
            &transport,
            "example.com",
            &QueryOptions::default().with_strategy(Strategy::OnlyIpv6),
        )
        .await
        .unwrap();

    assert_eq!(addrs, vec![MessageBuilder::ip("2001:db8::1")]);
    assert_eq!(transport.exchange_count(), 1);
}

#[tokio::test]
async fn test_lookup_partial_success_returns_surviving_family() {
    let resolver = resolver();
    let transport = MockTransport::with_exchange("upstream", |request| {
        if request.queries()[0].query_type() == RecordType::AAAA {
            return Err(DomainError::TransportTimeout {
                server: "192.0.2.53:53".to_string(),
            });
        }
        Ok(MessageBuilder::answer(request, &[MessageBuilder::ip("192.0.2.1")], 60))
    });

    let addrs = resolver
        .lookup(&QueryContext::new(), &transport, "example.com", &QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(addrs, vec![MessageBuilder::ip("192.0.2.1")]);
}

#[tokio::test]
async fn test_lookup_partial_success_when_ipv4_fails() {
    let resolver = resolver();
    let transport = MockTransport::with_exchange("upstream", |request| {
        if request.queries()[0].query_type() == RecordType::A {
            return Err(DomainError::TransportTimeout {
                server: "192.0.2.53:53".to_string(),
            });
        }
        Ok(MessageBuilder::answer(request, &[MessageBuilder::ip("2001:db8::1")], 60))
    });

    let addrs = resolver
        .lookup(&QueryContext::new(), &transport, "example.com", &QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(addrs, vec![MessageBuilder::ip("2001:db8::1")]);
    assert_eq!(transport.exchange_count(), 2);
}

#[tokio::test]
async fn test_lookup_reports_rcode_when_both_families_fail() {
    let resolver = resolver();
    let transport = MockTransport::with_exchange("upstream", |request| {
        Ok(MessageBuilder::rcode(request, ResponseCode::NXDomain))
    });

    let result = resolver
        .lookup(&QueryContext::new(), &transport, "missing.example", &QueryOptions::default())
        .await;

    assert_eq!(result.unwrap_err().rcode(), Some(RCodeError::NAME_ERROR));
}

#[tokio::test]
async fn test_lookup_reuses_exchange_cache() {
    let resolver = resolver();
    let transport = MockTransport::raw("upstream", &["192.0.2.1"], &[], 60);
    let ctx = QueryContext::new();
    let options = QueryOptions::default().with_strategy(Strategy::OnlyIpv4);

    resolver
        .exchange(&ctx, &transport, &MessageBuilder::query("example.com.", RecordType::A), &options)
        .await
        .unwrap();
    let addrs = resolver
        .lookup(&ctx, &transport, "example.com", &options)
        .await
        .unwrap();

    assert_eq!(addrs, vec![MessageBuilder::ip("192.0.2.1")]);
    assert_eq!(transport.exchange_count(), 1);
}

#[tokio::test]
async fn test_native_lookup_caches_each_family() {
    let resolver = resolver();
    let transport = MockTransport::native("hosts", &["192.0.2.7", "2001:db8::7"]);
    let ctx = QueryContext::new();

    let addrs = resolver
        .lookup(&ctx, &transport, "host.example", &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(addrs.len(), 2);

    let v6 = resolver
        .exchange(
            &ctx,
            &transport,
            &MessageBuilder::query("host.example.", RecordType::AAAA),
            &QueryOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        MessageBuilder::first_ip(&v6),
        Some(MessageBuilder::ip("2001:db8::7"))
    );
    assert_eq!(transport.lookup_count(), 1);
}

#[tokio::test]
async fn test_native_lookup_rejection_is_remembered() {
    let (resolver, store) = resolver_with_rdrc();
    let transport = MockTransport::native("hosts", &["10.0.0.9"]);
    let ctx = QueryContext::new();
    let options = QueryOptions::default();

    let first = resolver
        .lookup_with_response_check(&ctx, &transport, "host.example", &options, &reject_all)
        .await;
    match first {
        Err(DomainError::ResponseRejected(rejection)) => {
            assert_eq!(rejection.addresses().unwrap(), &[MessageBuilder::ip("10.0.0.9")]);
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    wait_for_rdrc(&store).await;

    let second = resolver
        .lookup_with_response_check(&ctx, &transport, "host.example", &options, &reject_all)
        .await;
    assert!(matches!(second, Err(DomainError::ResponseRejectedCached)));
    assert_eq!(transport.lookup_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_transport_times_out() {
    let resolver = Resolver::builder()
        .with_timeout(Duration::from_secs(1))
        .build();
    let transport =
        MockTransport::raw("slow", &["192.0.2.1"], &[], 60).delayed(Duration::from_secs(30));

    let result = resolver
        .exchange(
            &QueryContext::new(),
            &transport,
            &MessageBuilder::query("example.com.", RecordType::A),
            &QueryOptions::default(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::QueryTimeout)));
}

#[tokio::test]
async fn test_cancelled_context_aborts_exchange() {
    let resolver = resolver();
    let transport =
        MockTransport::raw("slow", &["192.0.2.1"], &[], 60).delayed(Duration::from_secs(30));
    let ctx = QueryContext::new();
    ctx.cancel();

    let result = resolver
        .exchange(
            &ctx,
            &transport,
            &MessageBuilder::query("example.com.", RecordType::A),
            &QueryOptions::default(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::Cancelled)));
}

#[tokio::test]
async fn test_cancellation_reaches_both_lookup_families() {
    let resolver = Arc::new(resolver());
    let transport = Arc::new(
        MockTransport::raw("slow", &["192.0.2.1"], &["2001:db8::1"], 60)
            .delayed(Duration::from_secs(30)),
    );
    let ctx = QueryContext::new();

    let task = {
        let resolver = Arc::clone(&resolver);
        let transport = Arc::clone(&transport);
        let ctx = ctx.clone();
        tokio::spawn(async move {
            resolver
                .lookup(&ctx, transport.as_ref(), "example.com", &QueryOptions::default())
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    ctx.cancel();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(DomainError::Cancelled)));
}
