pub mod a11y;
pub mod apply;
pub mod config;
pub mod controller;
pub mod error;
#[cfg(feature = "gtk")]
pub mod gtk;
pub mod logging;
pub mod ssr;
pub mod state;
pub mod storage;
pub mod system;
pub mod theme;
pub mod ui;

#[cfg(test)]
mod testing;

pub use controller::{ListenerId, ThemeController, ThemeEnvironment};
pub use error::{AppError, AppResult, ErrorKind};
pub use theme::{ResolvedTheme, ThemePreference};

/// Loads `config.json`, builds a controller over `environment` and runs the
/// pre-paint cycle. Used by host applications and the CLI.
pub fn start(environment: ThemeEnvironment) -> ThemeController {
    let config = config::load_app_config();
    let settings = config.settings();
    tracing::debug!(storage_key = settings.storage_key.as_str(), "starting theme controller");

    let controller = ThemeController::new(settings, environment);
    let resolved = controller.initialize();
    tracing::info!(%resolved, ready = controller.is_ready(), "theme ready");
    controller
}
