use climate_insights::{Config, app};
use env_logger::Env;

/// Start the dashboard web server
///
/// Configuration comes from `CLIMATE_*` environment variables; logging
/// honours `RUST_LOG` and defaults to `info`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    app::run(config).await
}
