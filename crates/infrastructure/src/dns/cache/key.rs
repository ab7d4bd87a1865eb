use compact_str::CompactString;
use warden_dns_domain::Question;

/// Cache key: the question, plus the transport name in per-transport mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub question: Question,
    pub transport: Option<CompactString>,
}

impl CacheKey {
    #[inline]
    pub fn shared(question: Question) -> Self {
        Self {
            question,
            transport: None,
        }
    }

    #[inline]
    pub fn per_transport(question: Question, transport: &str) -> Self {
        Self {
            question,
            transport: Some(CompactString::from(transport)),
        }
    }
}

/// Addressing mode of a resolver's cache, fixed when the resolver is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheMode {
    Shared,
    #[default]
    PerTransport,
}

impl CacheMode {
    #[inline]
    pub fn key(self, question: Question, transport: &str) -> CacheKey {
        match self {
            CacheMode::Shared => CacheKey::shared(question),
            CacheMode::PerTransport => CacheKey::per_transport(question, transport),
        }
    }
}
