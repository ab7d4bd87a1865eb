use async_trait::async_trait;
use compact_str::CompactString;
use dashmap::DashMap;
use hickory_proto::rr::RecordType;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use warden_dns_application::ports::RdrcStore;
use warden_dns_domain::DomainError;

pub const DEFAULT_RDRC_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Store size at which a save first sweeps out expired entries.
const MIN_PRUNE_THRESHOLD: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RdrcKey {
    transport: CompactString,
    name: CompactString,
    query_type: RecordType,
}

impl RdrcKey {
    fn new(transport: &str, name: &str, query_type: RecordType) -> Self {
        Self {
            transport: CompactString::from(transport),
            name: CompactString::from(name.to_ascii_lowercase()),
            query_type,
        }
    }
}

/// In-memory rejected-response cache.
///
/// Entries expire after `timeout`. Expired entries are dropped on the next
/// read of the same key, and swept in bulk once the store grows past a
/// threshold that doubles with the number of live entries.
#[derive(Clone)]
pub struct MemoryRdrcStore {
    entries: Arc<DashMap<RdrcKey, Instant, FxBuildHasher>>,
    timeout: Duration,
    prune_at: Arc<AtomicUsize>,
    min_prune_at: usize,
}

impl MemoryRdrcStore {
    pub fn new(timeout: Duration) -> Self {
        Self::with_prune_threshold(timeout, MIN_PRUNE_THRESHOLD)
    }

    fn with_prune_threshold(timeout: Duration, min_prune_at: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::with_hasher(FxBuildHasher)),
            timeout,
            prune_at: Arc::new(AtomicUsize::new(min_prune_at)),
            min_prune_at,
        }
    }

    fn insert(&self, key: RdrcKey) {
        if self.entries.len() >= self.prune_at.load(Ordering::Relaxed) {
            self.prune_expired();
        }
        self.entries.insert(key, Instant::now() + self.timeout);
    }

    fn prune_expired(&self) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        let live = self.entries.len();
        self.prune_at
            .store(live.saturating_mul(2).max(self.min_prune_at), Ordering::Relaxed);
        debug!(removed = before.saturating_sub(live), live, "Pruned expired rejected responses");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryRdrcStore {
    fn default() -> Self {
        Self::new(DEFAULT_RDRC_TIMEOUT)
    }
}

#[async_trait]
impl RdrcStore for MemoryRdrcStore {
    fn load(&self, transport: &str, name: &str, query_type: RecordType) -> bool {
        let key = RdrcKey::new(transport, name, query_type);
        match self.entries.entry(key) {
            dashmap::Entry::Vacant(_) => false,
            dashmap::Entry::Occupied(e) => {
                if Instant::now() >= *e.get() {
                    e.remove();
                    false
                } else {
                    true
                }
            }
        }
    }

    async fn save(
        &self,
        transport: &str,
        name: &str,
        query_type: RecordType,
    ) -> Result<(), DomainError> {
        self.insert(RdrcKey::new(transport, name, query_type));
        Ok(())
    }

    fn save_async(&self, transport: &str, name: &str, query_type: RecordType) {
        let store = self.clone();
        let transport = transport.to_string();
        let name = name.to_string();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match store.save(&transport, &name, query_type).await {
                        Ok(()) => debug!(
                            transport = %transport,
                            name = %name,
                            query_type = %query_type,
                            "Saved rejected response"
                        ),
                        Err(e) => warn!(
                            transport = %transport,
                            name = %name,
                            error = %e,
                            "Failed to save rejected response"
                        ),
                    }
                });
            }
            Err(_) => store.insert(RdrcKey::new(&transport, &name, query_type)),
        }
    }
}
