//! Core pool implementation: the acquisition and release protocol

use crate::config::PoolConfig;
use crate::descriptor::ConnectionSpec;
use crate::errors::{PoolError, PoolResult};
use crate::factory::ResourceFactory;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};
use crate::registry::Registry;
use crate::sweeper;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A checked-out resource that returns to the pool when dropped
pub struct PooledConn<M: ResourceFactory> {
    id: u64,
    resource: Option<M::Resource>,
    inner: Arc<PoolInner<M>>,
}

impl<M: ResourceFactory> PooledConn<M> {
    /// Registry id of this resource, stable across checkouts
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<M: ResourceFactory> Deref for PooledConn<M> {
    type Target = M::Resource;

    fn deref(&self) -> &Self::Target {
        self.resource.as_ref().expect("resource already taken")
    }
}

impl<M: ResourceFactory> DerefMut for PooledConn<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.resource.as_mut().expect("resource already taken")
    }
}

impl<M: ResourceFactory> Drop for PooledConn<M> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.inner.finish_release(self.id, resource, false);
        }
    }
}

impl<M> fmt::Debug for PooledConn<M>
where
    M: ResourceFactory,
    M::Resource: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConn")
            .field("id", &self.id)
            .field("resource", &self.resource)
            .finish()
    }
}

/// Thread-safe connection pool keyed by [`ConnectionSpec`].
///
/// `acquire` hands back an available resource opened against an equivalent
/// spec, or asks the factory for a new one. Releases recycle the resource
/// unless it has exceeded the checkout limit, and a lazily started
/// background sweeper closes resources that sit available for too long.
///
/// Cloning is cheap and every clone operates on the same pool.
pub struct Pool<M: ResourceFactory> {
    inner: Arc<PoolInner<M>>,
}

impl<M: ResourceFactory> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: ResourceFactory> fmt::Debug for Pool<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.status();
        f.debug_struct("Pool")
            .field("total", &status.total)
            .field("available", &status.available)
            .finish()
    }
}

/// Point-in-time counters for observability.
///
/// Like any snapshot taken outside a caller's own critical section, the
/// numbers can be stale by the time they are read.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolStatus {
    /// Resources currently tracked by the registry
    pub total: usize,

    /// Resources sitting available in the pool
    pub available: usize,

    /// Resources currently held by callers
    pub checked_out: usize,
}

pub(crate) struct Shared<T> {
    pub registry: Registry<T>,
    pub sweeper_running: bool,
}

pub(crate) struct PoolInner<M: ResourceFactory> {
    factory: M,
    pub(crate) shared: Mutex<Shared<M::Resource>>,
    pub(crate) sweeper_wakeup: Condvar,
    pub(crate) metrics: MetricsTracker,
    max_uses: AtomicUsize,
    max_idle_ms: AtomicU64,
    operation_timeout: Option<Duration>,
    validate_on_checkout: bool,
    next_id: AtomicU64,
}

impl<M: ResourceFactory> Pool<M> {
    /// Create a pool with default configuration
    pub fn new(factory: M) -> Self {
        Self::with_config(factory, PoolConfig::default())
    }

    /// Create a pool with the given configuration
    pub fn with_config(factory: M, config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                factory,
                shared: Mutex::new(Shared {
                    registry: Registry::new(),
                    sweeper_running: false,
                }),
                sweeper_wakeup: Condvar::new(),
                metrics: MetricsTracker::new(),
                max_uses: AtomicUsize::new(config.max_uses),
                max_idle_ms: AtomicU64::new(duration_to_millis(config.max_idle)),
                operation_timeout: config.operation_timeout,
                validate_on_checkout: config.validate_on_checkout,
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Check out a resource for the given spec.
    ///
    /// Reuses an available resource opened against an equivalent spec when
    /// one exists, otherwise opens a new one. Factory I/O (open, validate,
    /// prepare) runs outside the pool lock, so a slow open never blocks
    /// other acquirers. A factory failure propagates unchanged; retrying is
    /// the caller's decision.
    ///
    /// Every returned resource has been through
    /// [`ResourceFactory::prepare`], whichever path produced it.
    pub fn acquire(&self, spec: &ConnectionSpec) -> PoolResult<PooledConn<M>, M::Error> {
        let (id, resource) = self.inner.acquire(spec)?;
        Ok(PooledConn {
            id,
            resource: Some(resource),
            inner: Arc::clone(&self.inner),
        })
    }

    /// Check out a resource on the async runtime.
    ///
    /// Runs the blocking [`acquire`](Self::acquire) on the blocking thread
    /// pool and enforces the configured operation timeout. A resource
    /// acquired after the deadline fires is returned to the pool unused.
    pub async fn acquire_async(&self, spec: ConnectionSpec) -> PoolResult<PooledConn<M>, M::Error> {
        let pool = self.clone();
        let task = tokio::task::spawn_blocking(move || pool.acquire(&spec));
        match self.inner.operation_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(PoolError::Cancelled),
                Err(_) => Err(PoolError::Timeout(limit)),
            },
            None => match task.await {
                Ok(result) => result,
                Err(_) => Err(PoolError::Cancelled),
            },
        }
    }

    /// Return a resource to the pool, or close it when `force_close` is set.
    ///
    /// Dropping the guard is equivalent to `release(conn, false)`. Even
    /// without `force_close`, the resource is closed rather than recycled
    /// once its use count has reached the checkout limit. Release never
    /// fails: cleanup errors are logged and discarded, and releasing a
    /// resource the registry no longer knows (evicted while checked out) is
    /// a silent no-op apart from closing the orphaned handle.
    pub fn release(&self, mut conn: PooledConn<M>, force_close: bool) {
        if let Some(resource) = conn.resource.take() {
            // The guard knows which pool it came from; a guard released
            // through a different pool handle still settles with its owner.
            conn.inner.finish_release(conn.id, resource, force_close);
        }
    }

    /// Close every currently available resource.
    ///
    /// Checked-out resources are untouched and recycle normally when
    /// released.
    pub fn evict_available(&self) {
        let drained = self.inner.shared.lock().registry.drain_available();
        for (id, resource) in drained {
            self.inner.metrics.forced_closes.fetch_add(1, Ordering::Relaxed);
            self.inner.close_quietly(id, resource);
        }
    }

    /// Close every resource regardless of checkout state.
    ///
    /// Destructive: callers still holding a handle keep a working resource
    /// but it has been disowned, and it is closed for good the moment they
    /// release it. Available resources are closed immediately.
    pub fn evict_all(&self) {
        let (parked, invalidated) = self.inner.shared.lock().registry.drain_all();
        if invalidated > 0 {
            log::warn!("invalidated {invalidated} checked-out resources; each closes on release");
        }
        for (id, resource) in parked {
            self.inner.metrics.forced_closes.fetch_add(1, Ordering::Relaxed);
            self.inner.close_quietly(id, resource);
        }
    }

    /// Number of resources currently tracked by the pool
    pub fn total_count(&self) -> usize {
        self.inner.shared.lock().registry.len()
    }

    /// Number of resources currently available for reuse
    pub fn available_count(&self) -> usize {
        self.inner.shared.lock().registry.available_count()
    }

    /// Consistent snapshot of the pool counters
    pub fn status(&self) -> PoolStatus {
        let shared = self.inner.shared.lock();
        let total = shared.registry.len();
        let available = shared.registry.available_count();
        PoolStatus {
            total,
            available,
            checked_out: total - available,
        }
    }

    /// Checkout limit after which release closes a resource
    pub fn max_uses(&self) -> usize {
        self.inner.max_uses.load(Ordering::Relaxed)
    }

    /// Change the checkout limit.
    ///
    /// Tuning parameters are read with relaxed consistency: an operation
    /// already in flight may still act on the previous value.
    pub fn set_max_uses(&self, max_uses: usize) {
        self.inner.max_uses.store(max_uses, Ordering::Relaxed);
    }

    /// Idle duration after which the sweeper closes a resource
    pub fn max_idle(&self) -> Duration {
        self.inner.max_idle()
    }

    /// Change the idle limit.
    ///
    /// Wakes a sleeping sweeper so the new interval takes effect promptly
    /// instead of after the previous interval elapses.
    pub fn set_max_idle(&self, max_idle: Duration) {
        self.inner
            .max_idle_ms
            .store(duration_to_millis(max_idle), Ordering::Relaxed);
        self.inner.sweeper_wakeup.notify_all();
    }

    /// Snapshot of the pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        let status = self.status();
        self.inner.metrics.snapshot(status.total, status.available)
    }

    /// Export metrics in Prometheus exposition format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }

    pub(crate) fn from_inner(inner: Arc<PoolInner<M>>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner_any(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::clone(&self.inner) as Arc<dyn Any + Send + Sync>
    }
}

impl<M: ResourceFactory> PoolInner<M> {
    fn acquire(self: &Arc<Self>, spec: &ConnectionSpec) -> PoolResult<(u64, M::Resource), M::Error> {
        loop {
            let reused = self.shared.lock().registry.find_available(spec);
            match reused {
                Some((id, mut resource)) => {
                    if self.validate_on_checkout {
                        if let Err(err) = self.factory.validate(&mut resource) {
                            log::warn!("resource {id} failed its checkout probe: {err}");
                            self.metrics.validation_failures.fetch_add(1, Ordering::Relaxed);
                            self.shared.lock().registry.evict(id);
                            self.close_quietly(id, resource);
                            continue;
                        }
                    }
                    let resource = self.prepare(id, resource)?;
                    self.metrics.total_reused.fetch_add(1, Ordering::Relaxed);
                    return Ok((id, resource));
                }
                None => {
                    let resource = self.factory.open(spec).map_err(|err| {
                        self.metrics.open_failures.fetch_add(1, Ordering::Relaxed);
                        PoolError::OpenFailed(err)
                    })?;
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    self.shared.lock().registry.insert_new(id, spec.clone());
                    self.metrics.total_created.fetch_add(1, Ordering::Relaxed);
                    let resource = self.prepare(id, resource)?;
                    return Ok((id, resource));
                }
            }
        }
    }

    fn prepare(
        self: &Arc<Self>,
        id: u64,
        mut resource: M::Resource,
    ) -> PoolResult<M::Resource, M::Error> {
        match self.factory.prepare(&mut resource) {
            Ok(()) => Ok(resource),
            Err(err) => {
                self.shared.lock().registry.evict(id);
                self.close_quietly(id, resource);
                Err(PoolError::PrepareFailed(err))
            }
        }
    }

    pub(crate) fn finish_release(
        self: &Arc<Self>,
        id: u64,
        mut resource: M::Resource,
        force_close: bool,
    ) {
        let max_uses = self.max_uses.load(Ordering::Relaxed);
        let use_count = self.shared.lock().registry.use_count(id);

        let Some(use_count) = use_count else {
            // Evicted while checked out, e.g. by evict_all or a racing
            // sweep. The registry no-op still leaves us holding the
            // physical handle, which gets closed here.
            log::debug!("released resource {id} is no longer pooled; closing it");
            self.metrics.forced_closes.fetch_add(1, Ordering::Relaxed);
            self.close_quietly(id, resource);
            return;
        };

        if force_close || use_count >= max_uses {
            if force_close {
                self.metrics.forced_closes.fetch_add(1, Ordering::Relaxed);
            } else {
                log::debug!("resource {id} served {use_count} checkouts; closing");
                self.metrics.overuse_evictions.fetch_add(1, Ordering::Relaxed);
            }
            self.shared.lock().registry.evict(id);
            self.close_quietly(id, resource);
            return;
        }

        if let Err(err) = self.factory.reset(&mut resource) {
            log::warn!("discarding resource {id} that failed reset on release: {err}");
            self.shared.lock().registry.evict(id);
            self.close_quietly(id, resource);
            return;
        }

        let mut shared = self.shared.lock();
        match shared.registry.mark_available(id, resource) {
            Ok(()) => {
                self.metrics.total_recycled.fetch_add(1, Ordering::Relaxed);
                self.ensure_sweeper(&mut shared);
            }
            Err(resource) => {
                // The entry vanished while reset ran outside the lock.
                drop(shared);
                self.metrics.forced_closes.fetch_add(1, Ordering::Relaxed);
                self.close_quietly(id, resource);
            }
        }
    }

    fn ensure_sweeper(self: &Arc<Self>, shared: &mut Shared<M::Resource>) {
        if !shared.sweeper_running {
            shared.sweeper_running = true;
            sweeper::spawn(Arc::downgrade(self));
        }
    }

    pub(crate) fn close_quietly(&self, id: u64, resource: M::Resource) {
        if let Err(err) = self.factory.close(resource) {
            log::warn!("discarding error from closing resource {id}: {err}");
        }
    }

    pub(crate) fn max_idle(&self) -> Duration {
        Duration::from_millis(self.max_idle_ms.load(Ordering::Relaxed))
    }
}

impl<M: ResourceFactory> Drop for PoolInner<M> {
    fn drop(&mut self) {
        // Last handle gone: nothing can check these out anymore.
        let drained = self.shared.get_mut().registry.drain_available();
        for (id, resource) in drained {
            if let Err(err) = self.factory.close(resource) {
                log::warn!("discarding error from closing resource {id} at pool teardown: {err}");
            }
        }
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
