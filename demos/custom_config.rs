use std::sync::Arc;

use chrono::{TimeZone, Utc};
use nodeuid::{LocalSettings, Uid, UidConfig};

fn main() {
    // 8 node bits = 256 nodes, 30 sequence bits = ~1 billion IDs per minute per node
    let config = UidConfig::builder()
        .node_bits(8)
        .expect("node bits in range")
        .epoch(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
        .build();

    let settings = Arc::new(LocalSettings::in_dir(std::env::temp_dir(), 42));
    let generator = Uid::with_settings(config, settings).expect("failed to initialize generator");

    println!("Generator configuration:");
    println!("  Node bits: {}", config.node_bits());
    println!("  Sequence bits: {}", config.sequence_bits());
    println!("  Max node ID: {}", config.max_node_id());
    println!("  Max sequence per minute: {}", config.max_sequence());

    let id = generator.next_id();
    let (base, node, seq) = generator.decompose(id);

    println!("\nGenerated ID: {id}");
    println!("Components:");
    println!("  Base: {base} minutes since epoch");
    println!("  Node ID: {node} (of {})", config.max_node_id());
    println!("  Sequence: {seq} (of {})", config.max_sequence());
}
