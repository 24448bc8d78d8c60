//! # EsoxSolutions.ConnectionPool
//!
//! Thread-safe pooling for expensive, long-lived resources (database
//! connections and friends), matched for reuse by connection descriptor.
//!
//! ## Features
//!
//! - Descriptor-matched reuse: a resource is only handed to callers asking
//!   for the same url, user and password it was opened with
//! - Automatic return of resources via RAII (Drop trait), plus explicit
//!   release with an optional forced close
//! - Reuse-count eviction: resources retire after a configurable number of
//!   checkouts
//! - Idle sweeping: one lazily started background thread per pool closes
//!   resources that sit unused too long, and stops itself when there is
//!   nothing left to watch
//! - Live tuning: checkout and idle limits can change while the pool is in
//!   use
//! - Opt-in checkout validation
//! - Pool locator: scope-chain lookup plus a process-wide default pool
//! - Metrics with Prometheus export
//! - Async acquire with timeout on top of the blocking core
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_connpool::{ConnectionSpec, Pool, ResourceFactory};
//!
//! struct StringFactory;
//!
//! impl ResourceFactory for StringFactory {
//!     type Resource = String;
//!     type Error = std::io::Error;
//!
//!     fn open(&self, spec: &ConnectionSpec) -> Result<String, Self::Error> {
//!         Ok(format!("connected to {}", spec.url()))
//!     }
//!
//!     fn close(&self, _resource: String) -> Result<(), Self::Error> {
//!         Ok(())
//!     }
//! }
//!
//! let pool = Pool::new(StringFactory);
//! let spec = ConnectionSpec::new("db://localhost", "app", "secret");
//!
//! {
//!     let conn = pool.acquire(&spec).unwrap();
//!     assert!(conn.starts_with("connected to"));
//!     // Resource returns to the pool when `conn` goes out of scope
//! }
//!
//! assert_eq!(pool.available_count(), 1);
//! ```

mod config;
mod descriptor;
mod errors;
mod factory;
mod locator;
mod metrics;
mod pool;
mod registry;
mod sweeper;

pub use config::{DEFAULT_MAX_IDLE, DEFAULT_MAX_USES, PoolConfig};
pub use descriptor::ConnectionSpec;
pub use errors::{PoolError, PoolResult};
pub use factory::ResourceFactory;
pub use locator::{
    POOL_KEY, PoolScope, ScopeMap, find, get_global, global_scope, save, set_global,
};
pub use metrics::{MetricsExporter, PoolMetrics};
pub use pool::{Pool, PoolStatus, PooledConn};
