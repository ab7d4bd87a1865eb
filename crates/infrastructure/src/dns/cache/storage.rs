use lru::LruCache;
use rustc_hash::FxBuildHasher;
use std::hash::{BuildHasher, Hash};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

const SHARD_AMOUNT: usize = 16;

/// Capacity-bounded LRU split across mutex-guarded shards so concurrent
/// callers on different keys rarely contend.
pub struct ShardedLru<K, V> {
    shards: Box<[Mutex<LruCache<K, V, FxBuildHasher>>]>,
    hasher: FxBuildHasher,
}

impl<K: Hash + Eq, V> ShardedLru<K, V> {
    pub fn new(capacity: usize) -> Self {
        let per_shard = capacity.div_ceil(SHARD_AMOUNT).max(1);
        let per_shard = NonZeroUsize::new(per_shard).unwrap_or(NonZeroUsize::MIN);
        let shards = (0..SHARD_AMOUNT)
            .map(|_| Mutex::new(LruCache::with_hasher(per_shard, FxBuildHasher)))
            .collect();
        Self {
            shards,
            hasher: FxBuildHasher,
        }
    }

    #[inline]
    fn shard(&self, key: &K) -> MutexGuard<'_, LruCache<K, V, FxBuildHasher>> {
        let index = (self.hasher.hash_one(key) as usize) % self.shards.len();
        // A panic while holding the lock leaves the LRU structurally intact.
        self.shards[index]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` on the entry for `key`, if any, while holding its shard lock.
    /// `f` returns whether to keep the entry.
    pub fn with_entry<R>(&self, key: &K, f: impl FnOnce(&V) -> (R, bool)) -> Option<R> {
        let mut shard = self.shard(key);
        let (result, keep) = f(shard.get(key)?);
        if !keep {
            shard.pop(key);
        }
        Some(result)
    }

    pub fn insert(&self, key: K, value: V) {
        self.shard(&key).put(key, value);
    }

    pub fn purge(&self) {
        for shard in self.shards.iter() {
            shard
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clear();
        }
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .len()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
