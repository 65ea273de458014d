use std::{sync::Arc, time::Duration};

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod telemetry;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{db, utils};

use middlewares::basic_auth::ConsoleCredentials;
use repositories::provider::RepositoryProvider;

/// Application context built once at startup and shared with every worker.
pub struct AppState {
    pub app_name: String,
    pub provider: Arc<dyn RepositoryProvider>,
    pub request_timeout: Duration,
    pub console: ConsoleCredentials,
}

impl AppState {
    pub fn new(config: &settings::AppConfig, provider: Arc<dyn RepositoryProvider>) -> Self {
        AppState {
            app_name: config.name.clone(),
            provider,
            request_timeout: config.request_timeout(),
            console: ConsoleCredentials::new(
                config.console_username.clone(),
                config.console_password.clone(),
            ),
        }
    }
}
