//! Basic usage examples for the connection pool

use esox_connpool::{ConnectionSpec, Pool, PoolConfig, ResourceFactory};

#[derive(Debug)]
struct FakeConn {
    target: String,
}

struct FakeFactory;

impl ResourceFactory for FakeFactory {
    type Resource = FakeConn;
    type Error = std::io::Error;

    fn open(&self, spec: &ConnectionSpec) -> Result<FakeConn, Self::Error> {
        println!("   (factory) opening {}", spec.url());
        Ok(FakeConn {
            target: spec.url().to_string(),
        })
    }

    fn close(&self, resource: FakeConn) -> Result<(), Self::Error> {
        println!("   (factory) closing {}", resource.target);
        Ok(())
    }
}

fn main() {
    env_logger::init();
    println!("=== EsoxSolutions.ConnectionPool - Basic Examples ===\n");

    // Example 1: Acquire and automatic return
    simple_pool();

    // Example 2: Reuse across checkouts
    reuse();

    // Example 3: Configured limits
    configured_pool();

    // Example 4: Forced close and bulk eviction
    eviction();
}

fn simple_pool() {
    println!("1. Simple Pool:");
    let pool = Pool::new(FakeFactory);
    let spec = ConnectionSpec::new("db://localhost/app", "demo", "secret");

    {
        let conn = pool.acquire(&spec).unwrap();
        println!("   Got connection to: {}", conn.target);
        // Connection automatically returned when dropped
    }

    println!("   Available after return: {}\n", pool.available_count());
}

fn reuse() {
    println!("2. Reuse:");
    let pool = Pool::new(FakeFactory);
    let spec = ConnectionSpec::new("db://localhost/app", "demo", "secret");

    for round in 1..=3 {
        let conn = pool.acquire(&spec).unwrap();
        println!("   Round {}: using {}", round, conn.target);
        // Only the first round hits the factory
    }

    println!(
        "   Created {} connection(s) for 3 checkouts\n",
        pool.metrics().total_created
    );
}

fn configured_pool() {
    println!("3. Configured Pool:");

    let config = PoolConfig::new()
        .with_max_uses(2)
        .with_max_idle(std::time::Duration::from_secs(60));

    let pool = Pool::with_config(FakeFactory, config);
    let spec = ConnectionSpec::new("db://localhost/app", "demo", "secret");

    for _ in 0..3 {
        let conn = pool.acquire(&spec).unwrap();
        drop(conn);
    }

    // The first connection retired after two checkouts.
    println!("   Created: {}", pool.metrics().total_created);
    println!("   Retired for overuse: {}\n", pool.metrics().overuse_evictions);
}

fn eviction() {
    println!("4. Eviction:");
    let pool = Pool::new(FakeFactory);
    let spec = ConnectionSpec::new("db://localhost/app", "demo", "secret");

    let held = pool.acquire(&spec).unwrap();
    drop(pool.acquire(&spec).unwrap());
    println!(
        "   Before: total={} available={}",
        pool.total_count(),
        pool.available_count()
    );

    pool.evict_available();
    println!(
        "   After evict_available: total={} available={}",
        pool.total_count(),
        pool.available_count()
    );

    pool.release(held, true);
    println!("   After forced release: total={}", pool.total_count());
}
