//! Logger setup
//!
//! Shared by the library's wasm start function, `ScoreGuard::new` and the
//! native binary, so a page that loads only the `cdylib` still gets console
//! output and readable panics.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the platform logger. Later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        #[cfg(target_arch = "wasm32")]
        {
            console_error_panic_hook::set_once();
            // Fails only if another module on the page installed a logger first
            let _ = console_log::init_with_level(log::Level::Info);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = env_logger::try_init();
        }
    });
}
