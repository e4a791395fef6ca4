//! Log output setup.
//!
//! Library code only emits `tracing` events. The browser build forwards them
//! through `log` to the devtools console; native builds print them with
//! `tracing-subscriber`, filtered by `RUST_LOG` (default `info`).

/// Install the panic hook and the console logger. Safe to call more than once.
#[cfg(feature = "hydrate")]
pub fn init() {
    console_error_panic_hook::set_once();
    // Err means a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Install the global `tracing` subscriber. Safe to call more than once.
#[cfg(all(not(feature = "hydrate"), not(target_arch = "wasm32")))]
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(all(not(feature = "hydrate"), target_arch = "wasm32"))]
pub fn init() {}
