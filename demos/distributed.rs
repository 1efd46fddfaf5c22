use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nodeuid::{EtcdSettingsFactory, MemoryCoordinator, SharedCoordinator, Uid, UidConfig};
use rand::{rng, Rng};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // One coordinator shared by every "process"; node ids are leased from it
    let coordinator = Arc::new(SharedCoordinator::from_coordinator(Arc::new(
        MemoryCoordinator::new(),
    )));
    let factory = Arc::new(EtcdSettingsFactory::new(coordinator));
    let config = UidConfig::builder().node_bits(8).unwrap().build();

    let mut handles = vec![];
    for instance in 0..4 {
        let factory = Arc::clone(&factory);
        handles.push(thread::spawn(move || {
            let generator =
                Uid::with_factory(config, factory.as_ref()).expect("node registration failed");
            let mut ids = HashSet::new();
            let mut rng = rng();

            for i in 0..5 {
                let id = generator.next_id();
                let (base, node, seq) = generator.decompose(id);
                println!(
                    "Instance {instance} generated ID {i}: {id} (base={base}, node={node}, seq={seq})"
                );
                assert!(ids.insert(id), "Duplicate ID generated!");

                let delay = rng.random_range(0..=9);
                thread::sleep(Duration::from_millis(delay));
            }
            ids
        }));
    }

    let mut all_ids = HashSet::new();
    for handle in handles {
        all_ids.extend(handle.join().unwrap());
    }

    println!("\nTotal unique IDs generated: {}", all_ids.len());
    assert_eq!(all_ids.len(), 20, "IDs collided across instances!");
    println!("All IDs are unique across instances!");
}
