//! Student record tracker
//!
//! Serves the built-in collections with demo data:
//!
//! ```text
//! cargo run --example student_tracker [config.yaml]
//!
//! curl 'http://127.0.0.1:3000/api/students?status=Active&sort=-grade'
//! curl 'http://127.0.0.1:3000/api/students?search=jo&page=1&limit=2'
//! curl 'http://127.0.0.1:3000/api/feedback/stats?group_by=category&average=rating'
//! ```

use recordbook::prelude::*;
use recordbook::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_yaml_file(path)?,
        None => AppConfig {
            collections: catalog::NAMES
                .iter()
                .map(|name| CollectionConfig {
                    demo_seed: true,
                    ..CollectionConfig::new(*name)
                })
                .collect(),
            ..AppConfig::default()
        },
    };
    config.apply_env()?;
    config.validate()?;

    telemetry::init(&config.log_level)?;

    tracing::info!("Student tracker starting");
    let names: Vec<&str> = config.collections.iter().map(|c| c.name.as_str()).collect();
    tracing::info!("Collections: {}", names.join(", "));

    ServerBuilder::from_config(&config)
        .await?
        .serve(&config.bind_address())
        .await
}
