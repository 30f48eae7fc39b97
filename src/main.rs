use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use resume_api::api::{ApiServer, ApiState};
use resume_api::cli::{Cli, Commands};
use resume_api::config::{ApiConfig, ConfigOrigin};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (mut config, origin) = ApiConfig::load_or_default(&cli.config)?;
    config.apply_env_overrides()?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            init_tracing(&config.server.log_level);
            match &origin {
                ConfigOrigin::File(path) => info!("Config loaded from {}", path.display()),
                ConfigOrigin::CreatedDefault(path) => {
                    info!("Config file not found. Created default at {}", path.display())
                }
                ConfigOrigin::Defaults => warn!("Using built-in default config"),
            }
            if config.uses_default_secret() {
                warn!("JWT_SECRET not set; using the development secret");
            }

            let state = ApiState::from_config(&config)?;
            ApiServer::new(state, config.bind_addr()).start().await?;
        }
        Commands::ShowConfig => {
            let mut shown = config.clone();
            shown.auth.jwt_secret = "********".to_string();
            println!("{}", toml::to_string_pretty(&shown)?);
        }
    }
    Ok(())
}

fn init_tracing(default_level: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
