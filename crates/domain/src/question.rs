use compact_str::CompactString;
use hickory_proto::op::Query;
use hickory_proto::rr::{DNSClass, Name, RecordType};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

/// A normalised DNS question: lower-cased FQDN, record type and class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Question {
    name: CompactString,
    query_type: RecordType,
    query_class: DNSClass,
}

impl Question {
    pub fn new(name: &str, query_type: RecordType, query_class: DNSClass) -> Self {
        Self {
            name: normalize_name(name),
            query_type,
            query_class,
        }
    }

    /// Question of class IN.
    pub fn internet(name: &str, query_type: RecordType) -> Self {
        Self::new(name, query_type, DNSClass::IN)
    }

    pub fn from_query(query: &Query) -> Self {
        Self::new(
            &query.name().to_ascii(),
            query.query_type(),
            query.query_class(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn query_type(&self) -> RecordType {
        self.query_type
    }

    pub fn query_class(&self) -> DNSClass {
        self.query_class
    }

    pub fn to_query(&self) -> Result<Query, DomainError> {
        let name = Name::from_str(&self.name).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", self.name, e))
        })?;
        let mut query = Query::query(name, self.query_type);
        query.set_query_class(self.query_class);
        Ok(query)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.query_class, self.query_type)
    }
}

fn normalize_name(name: &str) -> CompactString {
    let mut normalized = CompactString::with_capacity(name.len() + 1);
    for c in name.chars() {
        normalized.push(c.to_ascii_lowercase());
    }
    if !normalized.ends_with('.') {
        normalized.push('.');
    }
    normalized
}

/// Strips the trailing root label of a fully-qualified name.
///
/// `"example.com."` and `"example.com"` both give `"example.com"`, `"."` gives `""`.
pub fn fqdn_to_domain(fqdn: &str) -> &str {
    fqdn.strip_suffix('.').unwrap_or(fqdn)
}

pub fn to_fqdn(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{}.", domain)
    }
}
