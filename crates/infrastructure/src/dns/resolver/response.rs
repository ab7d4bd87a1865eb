//! Helpers that build, inspect and rewrite response messages.

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::svcb::{SvcParamKey, SvcParamValue, SVCB};
use hickory_proto::rr::rdata::{A, AAAA, HTTPS};
use hickory_proto::rr::{RData, Record};
use std::net::IpAddr;
use warden_dns_domain::Strategy;

use crate::dns::cache::message_cache::{for_each_record, min_positive_ttl};

/// TTL given to synthesised answers when no rewrite is configured.
pub const DEFAULT_TTL: u32 = 600;

/// Header-only response to `request` carrying `code`.
pub fn empty_response(request: &Message, code: ResponseCode) -> Message {
    let mut response = Message::new(request.id(), MessageType::Response, OpCode::Query);
    response.set_recursion_desired(request.recursion_desired());
    response.set_response_code(code);
    response.add_queries(request.queries().iter().cloned());
    response
}

/// Rewrites the message ID through its header.
pub fn set_message_id(message: &mut Message, id: u16) {
    let mut header = *message.header();
    header.set_id(id);
    message.set_header(header);
}

/// Successful response answering `query` with one A or AAAA record per address.
pub fn fixed_response(id: u16, query: &Query, addrs: &[IpAddr], ttl: u32) -> Message {
    let mut response = Message::new(id, MessageType::Response, OpCode::Query);
    response.set_response_code(ResponseCode::NoError);
    response.add_query(query.clone());
    for addr in addrs {
        let rdata = match addr {
            IpAddr::V4(v4) => RData::A(A(*v4)),
            IpAddr::V6(v6) => RData::AAAA(AAAA(*v6)),
        };
        response.add_answer(Record::from_rdata(query.name().clone(), ttl, rdata));
    }
    response
}

/// Addresses carried by A, AAAA and HTTPS `ipv4hint`/`ipv6hint` answers.
pub fn message_to_addrs(message: &Message) -> Vec<IpAddr> {
    let mut addrs = Vec::with_capacity(message.answers().len());
    for record in message.answers() {
        match record.data() {
            RData::A(a) => addrs.push(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => addrs.push(IpAddr::V6(aaaa.0)),
            RData::HTTPS(HTTPS(svcb)) => {
                for (_, value) in svcb.svc_params() {
                    match value {
                        SvcParamValue::Ipv4Hint(hint) => {
                            addrs.extend(hint.0.iter().map(|a| IpAddr::V4(a.0)))
                        }
                        SvcParamValue::Ipv6Hint(hint) => {
                            addrs.extend(hint.0.iter().map(|aaaa| IpAddr::V6(aaaa.0)))
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    addrs
}

/// Concatenates both families, IPv6 first only under `PreferIpv6`.
pub fn sort_addrs(mut v4: Vec<IpAddr>, mut v6: Vec<IpAddr>, strategy: Strategy) -> Vec<IpAddr> {
    if strategy == Strategy::PreferIpv6 {
        v6.append(&mut v4);
        v6
    } else {
        v4.append(&mut v6);
        v4
    }
}

/// Strips the hint of the excluded family from HTTPS answers under a
/// single-family strategy.
pub fn filter_https_hints(message: &mut Message, strategy: Strategy) {
    let excluded = match strategy {
        Strategy::OnlyIpv4 => SvcParamKey::Ipv6Hint,
        Strategy::OnlyIpv6 => SvcParamKey::Ipv4Hint,
        _ => return,
    };
    for record in message.answers_mut() {
        let filtered = match record.data() {
            RData::HTTPS(HTTPS(svcb)) if svcb.svc_params().iter().any(|(k, _)| *k == excluded) => {
                let params = svcb
                    .svc_params()
                    .iter()
                    .filter(|(key, _)| *key != excluded)
                    .cloned()
                    .collect();
                SVCB::new(svcb.svc_priority(), svcb.target_name().clone(), params)
            }
            _ => continue,
        };
        let mut replacement =
            Record::from_rdata(record.name().clone(), record.ttl(), RData::HTTPS(HTTPS(filtered)));
        replacement.set_dns_class(record.dns_class());
        *record = replacement;
    }
}

/// Stamps one TTL on every record and returns it: `rewrite` if set, else the
/// smallest positive TTL in the message (zero when there is none).
pub fn normalize_ttl(message: &mut Message, rewrite: Option<u32>) -> u32 {
    let ttl = rewrite.unwrap_or_else(|| min_positive_ttl(message));
    for_each_record(message, |record| {
        record.set_ttl(ttl);
    });
    ttl
}
