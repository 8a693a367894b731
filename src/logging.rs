//! Logger setup for hosts, demos and tests.
//!
//! The library itself only emits through the `log` facade.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install `env_logger` as the global logger.
///
/// `verbose` lowers the default filter to debug, which shows phase-level
/// transitions (dropships, hive growth, weapon use). `RUST_LOG` still wins.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::from_env(Env::default().default_filter_or(level.to_string()));

    // Already installed by an earlier caller.
    let _ = builder.try_init();
}
