//! STICKERPRO web server: upload images in the browser, download a ZIP of stickers.
//!
//! All settings come from the environment (see `stickerpro::config::AppConfig`).

use stickerpro::config::AppConfig;
use stickerpro::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let _log_guard = logging::init(config.log_format, "info", config.log_dir.as_deref())?;

    tracing::info!("Starting sticker processing web app");
    stickerpro::web::serve(config).await?;
    Ok(())
}
