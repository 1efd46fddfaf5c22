use chrono::Duration;
use nodeuid::Uid;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Node 1, base persisted to {temp_dir}/uid_settings_1.bin
    let generator = Uid::new(1).expect("failed to initialize generator");

    println!("Node ID: {}", generator.node_id());
    println!("Base (minutes since 2025-01-01 00:00:00 UTC): {}", generator.base());

    println!("\nGenerated IDs (monotonic on this node):");
    for _ in 0..5 {
        print_id(generator.next_id(), &generator);
    }
}

fn print_id(id: u64, generator: &Uid) {
    let (base, node, sequence) = generator.decompose(id);
    let bucket = generator.config().epoch() + Duration::minutes(base as i64);
    println!("  ID: {id}, Minute: {bucket}, Node ID: {node}, Sequence: {sequence}");
}
