//! Async usage examples

use std::time::Duration;

use esox_connpool::{ConnectionSpec, Pool, PoolConfig, ResourceFactory};

#[derive(Debug)]
struct SlowConn {
    target: String,
}

struct SlowFactory {
    open_delay: Duration,
}

impl ResourceFactory for SlowFactory {
    type Resource = SlowConn;
    type Error = std::io::Error;

    fn open(&self, spec: &ConnectionSpec) -> Result<SlowConn, Self::Error> {
        std::thread::sleep(self.open_delay);
        Ok(SlowConn {
            target: spec.url().to_string(),
        })
    }

    fn close(&self, _resource: SlowConn) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    println!("=== EsoxSolutions.ConnectionPool - Async Examples ===\n");

    // Example 1: Async acquire
    async_acquire().await;

    // Example 2: Operation timeout
    async_with_timeout().await;

    // Example 3: Concurrent tasks sharing one pool
    concurrent_access().await;
}

async fn async_acquire() {
    println!("1. Async Acquire:");
    let pool = Pool::new(SlowFactory {
        open_delay: Duration::from_millis(20),
    });
    let spec = ConnectionSpec::new("db://localhost/app", "demo", "secret");

    {
        let conn = pool.acquire_async(spec).await.unwrap();
        println!("   Got connection asynchronously: {}", conn.target);
    }

    println!();
}

async fn async_with_timeout() {
    println!("2. Async with Timeout:");

    let config = PoolConfig::new().with_operation_timeout(Duration::from_millis(100));
    let pool = Pool::with_config(
        SlowFactory {
            open_delay: Duration::from_millis(500),
        },
        config,
    );
    let spec = ConnectionSpec::new("db://sluggish-host/app", "demo", "secret");

    // The factory is slower than the deadline
    match pool.acquire_async(spec).await {
        Ok(conn) => println!("   Got connection: {}", conn.target),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");

    let pool = Pool::new(SlowFactory {
        open_delay: Duration::from_millis(10),
    });
    let spec = ConnectionSpec::new("db://localhost/app", "demo", "secret");

    let mut handles = vec![];

    for i in 0..10 {
        let pool = pool.clone();
        let spec = spec.clone();
        let handle = tokio::spawn(async move {
            let conn = pool.acquire_async(spec).await.unwrap();
            println!("   Task {} got connection to {}", i, conn.target);
            tokio::time::sleep(Duration::from_millis(50)).await;
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!(
        "   Final: total={} available={}",
        pool.total_count(),
        pool.available_count()
    );
}
