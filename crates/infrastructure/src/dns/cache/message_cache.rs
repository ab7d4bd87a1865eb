use hickory_proto::op::Message;
use hickory_proto::rr::Record;
use std::time::{Duration, Instant};
use tracing::debug;

use super::key::CacheKey;
use super::storage::ShardedLru;

struct CacheEntry {
    message: Message,
    /// `None` in no-expire mode.
    expires_at: Option<Instant>,
}

/// Response cache with either TTL-driven expiry or capacity-only eviction.
///
/// Entries hold the response exactly as stored. On load the copy handed back
/// has its record TTLs decayed to the lifetime left at read time.
pub struct MessageCache {
    store: ShardedLru<CacheKey, CacheEntry>,
    disable_expire: bool,
}

impl MessageCache {
    pub fn new(capacity: usize, disable_expire: bool) -> Self {
        debug!(capacity, disable_expire, "Initializing DNS message cache");
        Self {
            store: ShardedLru::new(capacity),
            disable_expire,
        }
    }

    /// Returns a copy of the cached response and its remaining lifetime in
    /// seconds. Expired entries are evicted and read as a miss.
    pub fn load(&self, key: &CacheKey, now: Instant) -> Option<(Message, u32)> {
        self.store
            .with_entry(key, |entry| match entry.expires_at {
                None => {
                    let ttl = min_positive_ttl(&entry.message);
                    (Some((entry.message.clone(), ttl)), true)
                }
                Some(expires_at) if now >= expires_at => (None, false),
                Some(expires_at) => {
                    let remaining = expires_at.duration_since(now).as_secs() as u32;
                    let mut message = entry.message.clone();
                    decay_ttl(&mut message, remaining);
                    (Some((message, remaining)), true)
                }
            })
            .flatten()
    }

    /// Stores `message` for `ttl` seconds. A zero TTL stores nothing.
    pub fn store(&self, key: CacheKey, message: Message, ttl: u32, now: Instant) {
        if ttl == 0 {
            return;
        }
        let expires_at = if self.disable_expire {
            None
        } else {
            Some(now + Duration::from_secs(u64::from(ttl)))
        };
        self.store.insert(
            key,
            CacheEntry {
                message,
                expires_at,
            },
        );
    }

    pub fn clear(&self) {
        self.store.purge();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

pub(crate) fn min_positive_ttl(message: &Message) -> u32 {
    message
        .answers()
        .iter()
        .chain(message.name_servers())
        .chain(message.additionals())
        .map(Record::ttl)
        .filter(|ttl| *ttl > 0)
        .min()
        .unwrap_or(0)
}

/// Rewrites every record TTL so that the smallest one equals `remaining`.
///
/// With no positive TTL to anchor on, every record simply gets `remaining`.
pub(crate) fn decay_ttl(message: &mut Message, remaining: u32) {
    let original = min_positive_ttl(message);
    if original > 0 {
        let elapsed = original.saturating_sub(remaining);
        for_each_record(message, |record| {
            record.set_ttl(record.ttl().saturating_sub(elapsed));
        });
    } else {
        for_each_record(message, |record| {
            record.set_ttl(remaining);
        });
    }
}

/// Applies `f` to every record of the answer, authority and additional sections.
pub(crate) fn for_each_record(message: &mut Message, mut f: impl FnMut(&mut Record)) {
    message.answers_mut().iter_mut().for_each(&mut f);
    message.name_servers_mut().iter_mut().for_each(&mut f);
    message.additionals_mut().iter_mut().for_each(&mut f);
}
