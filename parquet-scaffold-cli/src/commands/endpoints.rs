use parquet_scaffold::{Reflector, ReflectorConfig};
use std::path::Path;
use tracing::error;

/// Reflect the database and regenerate the app's endpoints. Failures are
/// logged, not returned.
pub fn run_append_endpoints(config: &Path) {
    let result = ReflectorConfig::load(config).and_then(|config| Reflector::new(config).run());
    if let Err(e) = result {
        error!("Error: {e}");
    }
}
