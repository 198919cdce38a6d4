//! Config handling

use std::num::NonZeroU16;
use std::path::PathBuf;

use tracing::log::LevelFilter;
use url::Url;

use crate::cli::CliOptions;
use crate::error::CheckgenError;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Everything the server needs to start, resolved from the CLI/env.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind
    pub listen_address: String,
    /// Port to bind
    pub port: NonZeroU16,
    /// Where uploads are parked during a request
    pub scratch_dir: PathBuf,
    /// Where the latest strategy document lives
    pub strategy_path: PathBuf,
    /// The single origin allowed to call us from a browser
    pub cors_origin: String,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    /// Settings for the model client
    pub model: ModelConfig,
}

/// Settings for talking to the Gemini API.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// API key, missing keys only fail once a request is made
    pub api_key: Option<String>,
    /// Model name, eg `gemini-1.5-flash`
    pub model: String,
    /// Base URL, eg `https://generativelanguage.googleapis.com/v1beta`
    pub api_base: Url,
}

impl TryFrom<&CliOptions> for ServerConfig {
    type Error = CheckgenError;

    fn try_from(cli: &CliOptions) -> Result<Self, Self::Error> {
        Ok(Self {
            listen_address: cli.listen_address.clone(),
            port: cli.port,
            scratch_dir: cli.scratch_dir.clone(),
            strategy_path: cli.strategy_path.clone(),
            cors_origin: cli.cors_origin.clone(),
            max_upload_bytes: cli.max_upload_bytes,
            model: ModelConfig {
                api_key: cli
                    .gemini_api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty()),
                model: cli.model.clone(),
                api_base: Url::parse(&cli.api_base)?,
            },
        })
    }
}
