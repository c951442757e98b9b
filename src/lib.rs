pub mod config;
pub mod error;
pub mod export;
pub mod game_log;
pub mod grading;
pub mod http_client;
pub mod impact_registry;
pub mod injury_report;
pub mod lines;
pub mod pipeline;
pub mod projection;
pub mod weights;

use tracing_subscriber::EnvFilter;

/// Stderr logging for the binaries; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// `.env.local` wins over `.env`; both are optional.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}
