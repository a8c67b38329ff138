use proximity_engine::{resolve_app_paths, SaveFile, StartupError};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::SceneConfig;
use super::console::CommandConsole;
use super::controller::SceneController;

pub(crate) struct AppWiring {
    pub(crate) controller: SceneController,
    pub(crate) console: CommandConsole,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Proximity Highlighter Startup ===");

    let config = SceneConfig::from_env();
    let paths = resolve_app_paths()?;
    let save_file = SaveFile::in_dir(&paths.data_dir, &config.save_file_name);
    info!(
        path = %save_file.path().display(),
        seeded = config.spawn_seed.is_some(),
        spawn_half_extent = config.spawn_half_extent,
        "scene_configured"
    );

    Ok(AppWiring {
        controller: SceneController::new(config, save_file),
        console: CommandConsole::new(),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Console replies own stdout; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
