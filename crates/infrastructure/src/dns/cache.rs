pub mod key;
pub mod message_cache;
pub mod storage;

pub use key::{CacheKey, CacheMode};
pub use message_cache::MessageCache;
pub use storage::ShardedLru;
