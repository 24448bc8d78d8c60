// EsoxSolutions.ConnectionPool
// Thread-safe connection pool with descriptor matching and idle sweeping

// This is just a binary wrapper - the actual library is in lib.rs
// Run examples with: cargo run --example basic

use esox_connpool::{ConnectionSpec, Pool, ResourceFactory};

struct DemoFactory;

impl ResourceFactory for DemoFactory {
    type Resource = String;
    type Error = std::io::Error;

    fn open(&self, spec: &ConnectionSpec) -> Result<String, Self::Error> {
        Ok(format!("session[{}@{}]", spec.user(), spec.url()))
    }

    fn close(&self, _resource: String) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn main() {
    println!("=== EsoxSolutions.ConnectionPool ===");
    println!("See demos/ directory for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    // Quick demo
    println!("Quick Demo:");
    let pool = Pool::new(DemoFactory);
    let spec = ConnectionSpec::new("db://localhost/app", "demo", "secret");

    {
        let conn = pool.acquire(&spec).expect("in-memory open cannot fail");
        println!("  Got connection: {}", *conn);
    }

    println!("  Available after return: {}", pool.available_count());
}
