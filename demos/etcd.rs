//! Requires a running etcd, e.g. `ETCD_ENDPOINTS=http://127.0.0.1:2379`

use nodeuid::{EtcdSettingsFactory, Uid, UidConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let endpoints: Vec<String> = std::env::var("ETCD_ENDPOINTS")
        .unwrap_or_else(|_| "http://127.0.0.1:2379".to_owned())
        .split(',')
        .map(str::to_owned)
        .collect();

    let factory = EtcdSettingsFactory::connect(endpoints);
    let config = UidConfig::builder().node_bits(8).unwrap().build();

    let first = Uid::with_factory(config, &factory).expect("node registration failed");
    let second = Uid::with_factory(config, &factory).expect("node registration failed");

    for generator in [&first, &second] {
        let id = generator.next_id();
        let (base, node, seq) = generator.decompose(id);
        println!("node {node}: {id} (base={base}, seq={seq})");
    }
}
