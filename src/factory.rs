//! The boundary between the pool and the resources it manages

use crate::descriptor::ConnectionSpec;

/// Opens, recycles and closes the opaque handles held by a pool.
///
/// The pool never inspects a resource; everything resource-specific goes
/// through this trait. `open` may perform slow I/O and is always called
/// outside the pool's internal lock, as are the other capability calls.
///
/// Only `open` and `close` are mandatory. The recycling hooks default to
/// no-ops for resources that need no normalization:
///
/// - `prepare` runs on every checkout, on both fresh and reused resources,
///   before the handle reaches the caller (for database connections this is
///   where implicit auto-commit gets disabled).
/// - `reset` runs when a resource returns to the pool, so no residue from
///   the releasing caller leaks to the next borrower (e.g. rolling back
///   uncommitted work). A failed reset demotes the return into a close.
/// - `validate` is the opt-in checkout probe enabled by
///   [`PoolConfig::with_validation`](crate::PoolConfig::with_validation);
///   a failed probe evicts the resource and the lookup continues.
///
/// Errors from `close` are discarded by the pool (logged, never propagated),
/// so cleanup can never mask a caller's in-flight error.
pub trait ResourceFactory: Send + Sync + 'static {
    /// The pooled handle type
    type Resource: Send + 'static;

    /// Error produced by the capability calls
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a new resource for the given spec
    fn open(&self, spec: &ConnectionSpec) -> Result<Self::Resource, Self::Error>;

    /// Normalize a resource before handing it to a caller
    fn prepare(&self, _resource: &mut Self::Resource) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Clear caller residue when a resource returns to the pool
    fn reset(&self, _resource: &mut Self::Resource) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Cheap liveness probe used when checkout validation is enabled
    fn validate(&self, _resource: &mut Self::Resource) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Close a resource for good
    fn close(&self, resource: Self::Resource) -> Result<(), Self::Error>;
}
