pub mod analysis;
pub mod commands;
pub mod errors;
pub mod models;
pub mod store;

pub use analysis::weekly::compute as compute_weekly;
pub use store::{KeyedStore, StorageOrigin};

/// Installs the `env_logger` backend for the `log` macros used across the
/// crate. Honours `RUST_LOG`, defaults to `info`; repeated calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
