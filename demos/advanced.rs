//! Advanced features: idle sweeping, live tuning, the locator, metrics

use std::collections::HashMap;
use std::time::Duration;

use esox_connpool::{ConnectionSpec, Pool, PoolConfig, ResourceFactory, ScopeMap};

#[derive(Debug)]
struct Connection {
    id: usize,
    target: String,
}

struct CountingFactory {
    next: std::sync::atomic::AtomicUsize,
}

impl CountingFactory {
    fn new() -> Self {
        Self {
            next: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

impl ResourceFactory for CountingFactory {
    type Resource = Connection;
    type Error = std::io::Error;

    fn open(&self, spec: &ConnectionSpec) -> Result<Connection, Self::Error> {
        let id = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(Connection {
            id,
            target: spec.url().to_string(),
        })
    }

    fn close(&self, resource: Connection) -> Result<(), Self::Error> {
        println!("   (factory) closing connection {}", resource.id);
        Ok(())
    }
}

fn main() {
    env_logger::init();
    println!("=== EsoxSolutions.ConnectionPool - Advanced Features ===\n");

    // Example 1: Idle sweeping
    idle_sweeping();

    // Example 2: Live tuning
    live_tuning();

    // Example 3: Pool locator
    locator();

    // Example 4: Prometheus metrics
    prometheus_export();
}

fn idle_sweeping() {
    println!("1. Idle Sweeping:");

    let config = PoolConfig::new().with_max_idle(Duration::from_millis(500));
    let pool = Pool::with_config(CountingFactory::new(), config);
    let spec = ConnectionSpec::new("db://localhost/app", "demo", "secret");

    drop(pool.acquire(&spec).unwrap());
    println!("   Available after release: {}", pool.available_count());

    println!("   Waiting for the sweeper...");
    std::thread::sleep(Duration::from_secs(3));
    println!("   Available after sweep: {}\n", pool.available_count());
}

fn live_tuning() {
    println!("2. Live Tuning:");

    let pool = Pool::new(CountingFactory::new());
    let spec = ConnectionSpec::new("db://localhost/app", "demo", "secret");

    println!("   Default max_uses: {}", pool.max_uses());
    pool.set_max_uses(1);
    println!("   New max_uses: {}", pool.max_uses());

    // With max_uses=1, every release closes the connection.
    drop(pool.acquire(&spec).unwrap());
    println!("   Pooled after release: {}\n", pool.available_count());
}

fn locator() {
    println!("3. Pool Locator:");

    let request_scope = ScopeMap::new();
    let app_scope = ScopeMap::new();

    let pool = Pool::new(CountingFactory::new());
    esox_connpool::save(&app_scope, &pool);

    let found: Option<Pool<CountingFactory>> =
        esox_connpool::find(&[&request_scope, &app_scope]);
    println!("   Found in chain: {}", found.is_some());

    esox_connpool::set_global(&pool);
    let global: Option<Pool<CountingFactory>> = esox_connpool::get_global();
    println!("   Found as process-wide default: {}\n", global.is_some());
}

fn prometheus_export() {
    println!("4. Prometheus Metrics:");

    let pool = Pool::new(CountingFactory::new());
    let spec = ConnectionSpec::new("db://localhost/app", "demo", "secret");

    let conn = pool.acquire(&spec).unwrap();
    drop(pool.acquire(&spec).unwrap());

    let mut tags = HashMap::new();
    tags.insert("service".to_string(), "api".to_string());

    let text = pool.export_metrics_prometheus("example_pool", Some(&tags));
    println!("{}", text);

    drop(conn);
}
