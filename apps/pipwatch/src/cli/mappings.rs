//! Mapping management commands

use pipwatch_registry::{MappingRegistry, MappingSource, RegistryStats};

pub fn handle_update(registry: &mut MappingRegistry, json: bool) -> anyhow::Result<()> {
    eprintln!("Updating package mappings from remote source...");
    registry.load_mappings(true);
    let stats = registry.get_stats();

    if json {
        return print_json(&stats);
    }

    match registry.source() {
        Some(MappingSource::Remote) => println!("✓ Mappings updated successfully!"),
        Some(source) => println!(
            "⚠️  Could not fetch remote mappings, using {} mappings instead",
            source
        ),
        None => {}
    }
    println!("  Version: {}", stats.version);
    println!("  Total mappings: {}", stats.total_mappings);
    println!("  Last updated: {}", stats.last_updated);
    Ok(())
}

pub fn handle_clear(registry: &MappingRegistry) {
    eprintln!("Clearing cached mappings...");
    if registry.clear_cache() {
        println!("✓ Cache cleared successfully");
    } else {
        println!("No cache to clear");
    }
}

pub fn handle_show(registry: &mut MappingRegistry, json: bool) -> anyhow::Result<()> {
    let stats = registry.get_stats();

    if json {
        return print_json(&stats);
    }

    println!("📊 Package Mapping Statistics:");
    println!("  Version: {}", stats.version);
    println!("  Total mappings: {}", stats.total_mappings);
    println!("  Last updated: {}", stats.last_updated);
    println!("  Cache enabled: {}", if stats.cache_enabled { "True" } else { "False" });
    println!("  Cache location: {}", stats.cache_location);
    if let Some(source) = registry.source() {
        println!("  Source: {}", source);
    }
    Ok(())
}

fn print_json(stats: &RegistryStats) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}
