//! In-memory query result cache.
//!
//! Read results are cached per query fingerprint for a fixed TTL and evicted
//! by table whenever a write touches a table their SQL mentions. It supports:
//!
//! - SHA-256 fingerprints over SQL text and bound arguments
//! - Lazy expiry plus opportunistic sweeps past a size threshold
//! - Table-scoped invalidation via a pluggable [`TableResolver`]
//! - An injectable [`Clock`] for deterministic expiry

pub mod clock;
pub mod fingerprint;
pub mod query_cache;
pub mod table;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fingerprint::compute_fingerprint;
pub use query_cache::{CacheSettings, CacheStats, QueryCache};
pub use table::{KeywordTableResolver, TableResolver};
