use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use std::sync::Arc;
use warden_dns_domain::DomainError;

/// Remembers that a transport answered a question with a rejected response.
#[async_trait]
pub trait RdrcStore: Send + Sync {
    fn load(&self, transport: &str, name: &str, query_type: RecordType) -> bool;

    async fn save(
        &self,
        transport: &str,
        name: &str,
        query_type: RecordType,
    ) -> Result<(), DomainError>;

    /// Fire-and-forget save. Must not block, and failures are only logged.
    fn save_async(&self, transport: &str, name: &str, query_type: RecordType);
}

pub type RdrcFactory = Arc<dyn Fn() -> Arc<dyn RdrcStore> + Send + Sync>;
