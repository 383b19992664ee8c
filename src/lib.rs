pub mod commands;
pub mod config;
mod error;
pub mod links;
pub mod model;
pub mod repo;
pub mod report;
pub mod schema;
pub mod session;
pub mod state;
pub mod store;
pub mod time;
pub mod util;

pub use error::{AppError, AppResult};

/// Install the tracing subscriber for binaries. `COCKPIT_LOG` overrides
/// the default filter.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("COCKPIT_LOG").unwrap_or_else(|_| "cockpit=info".into()),
        )
        .json()
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .try_init();
}
