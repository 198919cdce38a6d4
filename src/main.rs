use clap::Parser;
use checkgen::config::{ServerConfig, setup_logging};
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = checkgen::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let config = match ServerConfig::try_from(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!("Configuration error: {}", err);
            return;
        }
    };

    if config.model.api_key.is_none() {
        error!(
            "No Gemini API key set ({}), generation requests will fail",
            checkgen::constants::GEMINI_API_KEY_ENV
        );
    }

    if let Err(err) = checkgen::web::setup_server(config).await {
        error!("Application error: {}", err);
    }
}
