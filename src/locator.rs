//! Finding and publishing pool instances across caller-defined scopes

use std::any::Any;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::factory::ResourceFactory;
use crate::pool::{Pool, PoolInner};

/// The fixed key pools are stored under in a scope.
///
/// Crate-qualified to keep it collision resistant inside attribute maps
/// shared with unrelated values.
pub const POOL_KEY: &str = "nl.esoxsolutions.connpool.pool";

/// A keyed attribute store a pool can be published into.
///
/// Implementations model whatever scoping the host application has: a
/// request context, a session, an application registry, the process-wide
/// singleton. The locator only ever reads and writes [`POOL_KEY`].
pub trait PoolScope: Send + Sync {
    /// Fetch the value stored under `key`, if any
    fn load(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>>;

    /// Store `value` under `key`, replacing any previous value
    fn store(&self, key: &'static str, value: Arc<dyn Any + Send + Sync>);
}

/// Concurrent attribute map implementing [`PoolScope`]
#[derive(Default)]
pub struct ScopeMap {
    entries: DashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl ScopeMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoolScope for ScopeMap {
    fn load(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries.get(key).map(|value| Arc::clone(value.value()))
    }

    fn store(&self, key: &'static str, value: Arc<dyn Any + Send + Sync>) {
        self.entries.insert(key, value);
    }
}

/// Walk the scope chain and return the first pool found.
///
/// Scopes are consulted in order, so callers list the narrowest scope first
/// (request, then session, then [`global_scope`]). A stored value of the
/// wrong factory type is skipped like any other miss.
///
/// # Examples
///
/// ```
/// use esox_connpool::{ConnectionSpec, Pool, PoolScope, ResourceFactory, ScopeMap};
///
/// struct StringFactory;
/// impl ResourceFactory for StringFactory {
///     type Resource = String;
///     type Error = std::io::Error;
///     fn open(&self, spec: &ConnectionSpec) -> Result<String, Self::Error> {
///         Ok(spec.url().to_string())
///     }
///     fn close(&self, _resource: String) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
///
/// let request_scope = ScopeMap::new();
/// let app_scope = ScopeMap::new();
///
/// let pool = Pool::new(StringFactory);
/// esox_connpool::save(&app_scope, &pool);
///
/// let found: Pool<StringFactory> =
///     esox_connpool::find(&[&request_scope, &app_scope]).expect("pool was saved");
/// assert_eq!(found.total_count(), 0);
/// ```
pub fn find<M: ResourceFactory>(chain: &[&dyn PoolScope]) -> Option<Pool<M>> {
    chain.iter().find_map(|scope| {
        let value = scope.load(POOL_KEY)?;
        let inner = value.downcast::<PoolInner<M>>().ok()?;
        Some(Pool::from_inner(inner))
    })
}

/// Publish a pool into a scope under [`POOL_KEY`]
pub fn save<M: ResourceFactory>(scope: &dyn PoolScope, pool: &Pool<M>) {
    scope.store(POOL_KEY, pool.inner_any());
}

static GLOBAL_SCOPE: OnceLock<ScopeMap> = OnceLock::new();

/// The process-wide scope, for use at the end of a lookup chain
pub fn global_scope() -> &'static ScopeMap {
    GLOBAL_SCOPE.get_or_init(ScopeMap::new)
}

/// Register a pool as the process-wide default. Last writer wins.
pub fn set_global<M: ResourceFactory>(pool: &Pool<M>) {
    save(global_scope(), pool);
}

/// Fetch the process-wide default pool, if one has been registered
pub fn get_global<M: ResourceFactory>() -> Option<Pool<M>> {
    find(&[global_scope()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ConnectionSpec;

    #[derive(Clone, Default)]
    struct UnitFactory;

    impl ResourceFactory for UnitFactory {
        type Resource = ();
        type Error = std::io::Error;

        fn open(&self, _spec: &ConnectionSpec) -> Result<(), Self::Error> {
            Ok(())
        }

        fn close(&self, _resource: ()) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn find_walks_the_chain_in_order() {
        let request = ScopeMap::new();
        let session = ScopeMap::new();

        assert!(find::<UnitFactory>(&[&request, &session]).is_none());

        let session_pool = Pool::new(UnitFactory);
        save(&session, &session_pool);
        let found = find::<UnitFactory>(&[&request, &session]).unwrap();
        assert_eq!(found.total_count(), session_pool.total_count());

        // A nearer scope shadows a farther one.
        let request_pool = Pool::new(UnitFactory);
        let spec = ConnectionSpec::new("db://host", "user", "pw");
        let conn = request_pool.acquire(&spec).unwrap();
        save(&request, &request_pool);

        let found = find::<UnitFactory>(&[&request, &session]).unwrap();
        assert_eq!(found.total_count(), 1);
        drop(conn);
    }

    #[test]
    fn wrong_factory_type_is_a_miss() {
        #[derive(Clone, Default)]
        struct OtherFactory;
        impl ResourceFactory for OtherFactory {
            type Resource = u32;
            type Error = std::io::Error;
            fn open(&self, _spec: &ConnectionSpec) -> Result<u32, Self::Error> {
                Ok(0)
            }
            fn close(&self, _resource: u32) -> Result<(), Self::Error> {
                Ok(())
            }
        }

        let scope = ScopeMap::new();
        save(&scope, &Pool::new(UnitFactory));
        assert!(find::<OtherFactory>(&[&scope]).is_none());
        assert!(find::<UnitFactory>(&[&scope]).is_some());
    }

    #[test]
    fn global_singleton_is_last_writer_wins() {
        let first = Pool::new(UnitFactory);
        set_global(&first);
        assert!(get_global::<UnitFactory>().is_some());

        let second = Pool::new(UnitFactory);
        let spec = ConnectionSpec::new("db://host", "user", "pw");
        let conn = second.acquire(&spec).unwrap();
        set_global(&second);

        let found = get_global::<UnitFactory>().unwrap();
        assert_eq!(found.total_count(), 1);
        drop(conn);
    }
}
