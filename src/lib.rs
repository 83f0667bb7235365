pub mod api; // Mock REST server for the backend contract
pub mod backend; // REST client + in-process mock
pub mod config;
pub mod core_state; // Shared records, flow store, session
pub mod dashboards; // Role view-models
pub mod db;
pub mod flow; // Patient-flow pub/sub store
pub mod models;
pub mod notify; // Toasts
pub mod records;

use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;
use crate::core_state::{CoreError, CoreState};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `config::default_log_filter()`. Safe to call
/// more than once, later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Build the application state against the configured backend and pull
/// every collection once. Collections that fail to load keep their sample
/// data and show as out of sync.
pub fn start(config: &ClientConfig) -> Result<CoreState, CoreError> {
    init_tracing();
    tracing::info!(
        backend = %config.base_url,
        "{} starting v{}",
        config::APP_NAME,
        config::APP_VERSION
    );

    let state = CoreState::from_config(config)?;
    state.refresh()?;
    Ok(state)
}
