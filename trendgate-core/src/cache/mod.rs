//! Caching module for Trendgate
//!
//! Bounded, time-limited memoization of provider results. Eviction is strict
//! insertion order (FIFO), expiry is lazy: an entry older than the TTL reads as
//! absent and is dropped by that read. There is no background sweep.

pub mod fifo;
pub mod key;
pub mod store;
pub mod traits;

pub use fifo::FifoCache;
pub use key::CacheKey;
pub use store::CacheStore;
pub use traits::{Cache, CacheEntry};
