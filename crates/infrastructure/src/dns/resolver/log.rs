use hickory_proto::op::Message;
use hickory_proto::rr::Record;
use tracing::{debug, info};
use warden_dns_domain::{fqdn_to_domain, RCodeError};

fn records(message: &Message) -> impl Iterator<Item = &Record> {
    message
        .answers()
        .iter()
        .chain(message.name_servers())
        .chain(message.additionals())
}

fn question_domain(message: &Message) -> Option<String> {
    let query = message.queries().first()?;
    Some(fqdn_to_domain(&query.name().to_ascii()).to_string())
}

pub(crate) fn log_cached_response(message: &Message, ttl: u32) {
    let Some(domain) = question_domain(message) else {
        return;
    };
    debug!(
        domain = %domain,
        rcode = %RCodeError::from(message.response_code()),
        ttl,
        "cached"
    );
    for record in records(message) {
        info!(record_type = %record.record_type(), record = %format_record(record), "cache");
    }
}

pub(crate) fn log_exchange_response(message: &Message, ttl: u32) {
    let Some(domain) = question_domain(message) else {
        return;
    };
    debug!(
        domain = %domain,
        rcode = %RCodeError::from(message.response_code()),
        ttl,
        "exchanged"
    );
    for record in records(message) {
        info!(record_type = %record.record_type(), record = %format_record(record), "exchange");
    }
}

pub(crate) fn log_reject_response(message: &Message) {
    debug!(domain = ?question_domain(message), "rejected dns");
    for record in records(message) {
        info!(record_type = %record.record_type(), record = %format_record(record), "reject");
    }
}

/// Single-line presentation of a record: tabs and newlines become single spaces.
pub fn format_record(record: &Record) -> String {
    record
        .to_string()
        .trim_start_matches(';')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
