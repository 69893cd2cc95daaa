//! Test logging.
//!
//! Resolution, registry and locator code emit `tracing` events. The `log`
//! feature forwards them to the `log` facade, so a plain `env_logger`
//! subscriber shows them when `RUST_LOG` is set.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes `env_logger` in test mode.
///
/// Safe to call from every test; only the first call installs the logger.
///
/// # Examples
///
/// ```
/// use reinhardt_fixture_builder::logging::init_test_logging;
///
/// init_test_logging();
/// init_test_logging();
/// ```
pub fn init_test_logging() {
	INIT.call_once(|| {
		let _ = env_logger::builder().is_test(true).try_init();
	});
}
