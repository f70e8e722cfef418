//! Tracing setup for tests.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a global `fmt` subscriber writing through the test harness.
///
/// The filter comes from `RUST_LOG` and defaults to `mockevent=debug`. Safe
/// to call from every test; only the first call installs anything, and a
/// subscriber installed elsewhere is left in place.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mockevent=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
