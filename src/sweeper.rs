//! Background eviction of idle resources

use std::cmp;
use std::sync::Weak;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use crate::factory::ResourceFactory;
use crate::pool::PoolInner;

/// Floor for the sweep interval so tiny idle limits cannot busy-spin
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// How long the sweeper naps between scans.
///
/// One periodic sweep per pool keeps background overhead O(1) regardless of
/// pool size, at the cost of entries living up to one interval past their
/// idle deadline.
pub(crate) fn sweep_interval(max_idle: Duration) -> Duration {
    cmp::max(MIN_SWEEP_INTERVAL, max_idle / 10)
}

/// Start the sweeper thread for a pool.
///
/// Callers must hold the pool lock and have flipped `sweeper_running`; that
/// keeps start and exit serialized under the same exclusion as the registry,
/// so two releases can never race a second sweeper into existence.
pub(crate) fn spawn<M: ResourceFactory>(inner: Weak<PoolInner<M>>) {
    thread::Builder::new()
        .name("connpool-sweeper".to_string())
        .spawn(move || run(inner))
        .expect("failed to spawn connpool sweeper thread");
}

fn run<M: ResourceFactory>(weak: Weak<PoolInner<M>>) {
    log::debug!("idle sweeper started");
    loop {
        // Holding only a weak handle lets an abandoned pool tear down; its
        // still-parked resources are closed by the pool's Drop.
        let Some(inner) = weak.upgrade() else {
            log::debug!("idle sweeper exiting: pool is gone");
            return;
        };

        let mut shared = inner.shared.lock();
        if shared.registry.available_count() == 0 {
            shared.sweeper_running = false;
            log::debug!("idle sweeper exiting: nothing left to watch");
            return;
        }

        let max_idle = inner.max_idle();
        let expired = shared.registry.take_idle(max_idle);
        drop(shared);

        for (id, resource) in expired {
            log::debug!("evicting resource {id} idle past {max_idle:?}");
            inner.metrics.idle_evictions.fetch_add(1, Ordering::Relaxed);
            inner.close_quietly(id, resource);
        }

        // Changing the idle limit notifies the condvar, so a new interval
        // takes effect now rather than after the old nap elapses.
        let nap = sweep_interval(max_idle);
        let mut shared = inner.shared.lock();
        let _ = inner.sweeper_wakeup.wait_for(&mut shared, nap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_a_tenth_of_the_idle_limit_with_a_floor() {
        assert_eq!(sweep_interval(Duration::from_secs(3600)), Duration::from_secs(360));
        assert_eq!(sweep_interval(Duration::from_secs(20)), Duration::from_secs(2));
        assert_eq!(sweep_interval(Duration::from_millis(500)), Duration::from_secs(1));
        assert_eq!(sweep_interval(Duration::ZERO), Duration::from_secs(1));
    }
}
