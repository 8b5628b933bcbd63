//! List registered behavior types

use anyhow::Result;
use flare_particles::BehaviorRegistry;

pub fn run() -> Result<()> {
    let registry = BehaviorRegistry::with_defaults();

    println!("Behaviors:");
    for name in registry.names() {
        println!("  {}", name);
    }
    println!();
    println!("Spawn shapes:");
    for name in registry.shapes().names() {
        println!("  {}", name);
    }
    Ok(())
}
