//! Bookkeeping for every live resource owned by a pool

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::descriptor::ConnectionSpec;

/// Pooling metadata for one live resource.
///
/// The resource itself parks in `slot` while it is available; a taken slot
/// means the handle is checked out and held by a caller. That makes the
/// mutual exclusion between "available" and "checked out" structural rather
/// than a flag to keep in sync.
struct Entry<T> {
    slot: Option<T>,
    spec: ConnectionSpec,
    use_count: usize,
    last_released: Instant,
}

/// Maps resource ids to their entries and tracks the available count.
///
/// All methods take `&mut self`; the pool wraps the registry in a single
/// mutex so every state transition, including the multi-entry ones, sees a
/// consistent view. Invariant: `available` equals the number of entries
/// with an occupied slot.
pub(crate) struct Registry<T> {
    entries: HashMap<u64, Entry<T>>,
    available: usize,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            available: 0,
        }
    }

    /// Linear scan for an available entry matching the spec.
    ///
    /// On a match the entry flips to checked out: the slot is taken, the use
    /// count bumps and the available count drops. Any match is acceptable;
    /// no LRU or MRU preference is promised. O(n), which is fine for the
    /// low hundreds of entries a pool realistically holds.
    pub fn find_available(&mut self, spec: &ConnectionSpec) -> Option<(u64, T)> {
        let id = self
            .entries
            .iter()
            .find_map(|(id, entry)| (entry.slot.is_some() && entry.spec == *spec).then_some(*id))?;
        let entry = self.entries.get_mut(&id)?;
        let resource = entry.slot.take()?;
        entry.use_count += 1;
        self.available -= 1;
        Some((id, resource))
    }

    /// Add a freshly opened resource as checked out.
    ///
    /// The use count starts at 1 because creation implies immediate first
    /// use; the available count is untouched.
    pub fn insert_new(&mut self, id: u64, spec: ConnectionSpec) {
        self.entries.insert(
            id,
            Entry {
                slot: None,
                spec,
                use_count: 1,
                last_released: Instant::now(),
            },
        );
    }

    pub fn use_count(&self, id: u64) -> Option<usize> {
        self.entries.get(&id).map(|entry| entry.use_count)
    }

    /// Park a resource back into its entry and stamp the release time.
    ///
    /// Unknown ids hand the resource back to the caller instead, so a
    /// release racing an eviction can still close the orphaned handle.
    pub fn mark_available(&mut self, id: u64, resource: T) -> Result<(), T> {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                debug_assert!(entry.slot.is_none(), "resource {id} parked twice");
                entry.slot = Some(resource);
                entry.last_released = Instant::now();
                self.available += 1;
                Ok(())
            }
            None => Err(resource),
        }
    }

    /// Remove an entry unconditionally.
    ///
    /// Returns the parked resource if the entry was available; a checked-out
    /// entry just loses its metadata and yields `None`.
    pub fn evict(&mut self, id: u64) -> Option<T> {
        let entry = self.entries.remove(&id)?;
        if entry.slot.is_some() {
            self.available -= 1;
        }
        entry.slot
    }

    /// Remove and return every available entry idle longer than `max_idle`
    pub fn take_idle(&mut self, max_idle: Duration) -> Vec<(u64, T)> {
        let now = Instant::now();
        let expired: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.slot.is_some() && now.duration_since(entry.last_released) > max_idle
            })
            .map(|(id, _)| *id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.evict(id).map(|resource| (id, resource)))
            .collect()
    }

    /// Remove and return every available entry
    pub fn drain_available(&mut self) -> Vec<(u64, T)> {
        let parked: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.slot.is_some())
            .map(|(id, _)| *id)
            .collect();
        parked
            .into_iter()
            .filter_map(|id| self.evict(id).map(|resource| (id, resource)))
            .collect()
    }

    /// Remove every entry.
    ///
    /// Returns the parked resources for closing plus the number of
    /// checked-out entries that were invalidated under their callers.
    pub fn drain_all(&mut self) -> (Vec<(u64, T)>, usize) {
        let mut parked = Vec::new();
        let mut invalidated = 0;
        for (id, entry) in self.entries.drain() {
            match entry.slot {
                Some(resource) => parked.push((id, resource)),
                None => invalidated += 1,
            }
        }
        self.available = 0;
        (parked, invalidated)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn available_count(&self) -> usize {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ConnectionSpec {
        ConnectionSpec::new("db://host", "user", "pw")
    }

    #[test]
    fn insert_starts_checked_out_with_one_use() {
        let mut registry: Registry<&str> = Registry::new();
        registry.insert_new(1, spec());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.available_count(), 0);
        assert_eq!(registry.use_count(1), Some(1));
        assert!(registry.find_available(&spec()).is_none());
    }

    #[test]
    fn park_and_find_round_trip_bumps_use_count() {
        let mut registry = Registry::new();
        registry.insert_new(1, spec());
        registry.mark_available(1, "conn").unwrap();
        assert_eq!(registry.available_count(), 1);

        let (id, resource) = registry.find_available(&spec()).unwrap();
        assert_eq!(id, 1);
        assert_eq!(resource, "conn");
        assert_eq!(registry.use_count(1), Some(2));
        assert_eq!(registry.available_count(), 0);
    }

    #[test]
    fn find_respects_spec_equivalence() {
        let mut registry = Registry::new();
        registry.insert_new(1, spec());
        registry.mark_available(1, "conn").unwrap();

        let other = ConnectionSpec::new("db://elsewhere", "user", "pw");
        assert!(registry.find_available(&other).is_none());
        assert_eq!(registry.available_count(), 1);
    }

    #[test]
    fn mark_available_returns_resource_for_unknown_id() {
        let mut registry: Registry<&str> = Registry::new();
        assert_eq!(registry.mark_available(99, "orphan"), Err("orphan"));
        assert_eq!(registry.available_count(), 0);
    }

    #[test]
    fn evict_fixes_available_count() {
        let mut registry = Registry::new();
        registry.insert_new(1, spec());
        registry.insert_new(2, spec());
        registry.mark_available(1, "parked").unwrap();

        assert_eq!(registry.evict(1), Some("parked"));
        assert_eq!(registry.available_count(), 0);
        assert_eq!(registry.evict(2), None);
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.evict(2), None);
    }

    #[test]
    fn take_idle_only_harvests_expired_entries() {
        let mut registry = Registry::new();
        registry.insert_new(1, spec());
        registry.mark_available(1, "old").unwrap();
        registry.insert_new(2, spec());

        std::thread::sleep(Duration::from_millis(30));
        registry.insert_new(3, spec());
        registry.mark_available(3, "fresh").unwrap();

        let idle = registry.take_idle(Duration::from_millis(20));
        assert_eq!(idle, vec![(1, "old")]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.available_count(), 1);
    }

    #[test]
    fn drain_all_separates_parked_from_invalidated() {
        let mut registry = Registry::new();
        registry.insert_new(1, spec());
        registry.mark_available(1, "parked").unwrap();
        registry.insert_new(2, spec());

        let (parked, invalidated) = registry.drain_all();
        assert_eq!(parked, vec![(1, "parked")]);
        assert_eq!(invalidated, 1);
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.available_count(), 0);
    }
}
