#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::IpAddr;
use std::str::FromStr;

pub struct MessageBuilder;

impl MessageBuilder {
    pub fn query(domain: &str, record_type: RecordType) -> Message {
        let mut message = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(Query::query(Name::from_str(domain).unwrap(), record_type));
        message
    }

    /// Answers every address of the requested family found in `addrs`.
    pub fn answer(request: &Message, addrs: &[IpAddr], ttl: u32) -> Message {
        let mut response = Self::rcode(request, ResponseCode::NoError);
        let query = &request.queries()[0];
        for addr in addrs {
            let rdata = match (addr, query.query_type()) {
                (IpAddr::V4(v4), RecordType::A) => RData::A(A(*v4)),
                (IpAddr::V6(v6), RecordType::AAAA) => RData::AAAA(AAAA(*v6)),
                _ => continue,
            };
            response.add_answer(Record::from_rdata(query.name().clone(), ttl, rdata));
        }
        response
    }

    pub fn rcode(request: &Message, code: ResponseCode) -> Message {
        let mut response = Message::new(request.id(), MessageType::Response, OpCode::Query);
        response.set_response_code(code);
        response.add_queries(request.queries().iter().cloned());
        response
    }

    /// A query carrying no question at all.
    pub fn empty() -> Message {
        Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query)
    }

    pub fn first_ip(message: &Message) -> Option<IpAddr> {
        message.answers().iter().find_map(|record| match record.data() {
            RData::A(a) => Some(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
    }

    pub fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }
}
