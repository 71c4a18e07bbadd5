#![cfg(not(tarpaulin_include))]

use sheet_filter::app;
use sheet_filter::config::Config;

/// Main entry point for the web application
///
/// Loads an optional `.env` file, initializes logging (`RUST_LOG`, default
/// `info`) and runs the web server with the configuration read from the
/// environment.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    log::info!(
        "Starting server with uploads in {}",
        config.upload_dir.display()
    );

    app::run(config).await
}
