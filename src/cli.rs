//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "CHECKGEN_DEBUG")]
    /// Enable debug logging. Env: CHECKGEN_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "5000", env = "CHECKGEN_PORT")]
    /// http listener, defaults to `5000`.
    /// Env: CHECKGEN_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "CHECKGEN_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: CHECKGEN_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, default_value = "temp_uploads", env = "CHECKGEN_SCRATCH_DIR")]
    /// Directory uploads are written to for the length of a request.
    /// Env: CHECKGEN_SCRATCH_DIR
    pub scratch_dir: PathBuf,

    #[clap(
        long,
        default_value = "current_strategy.txt",
        env = "CHECKGEN_STRATEGY_PATH"
    )]
    /// File holding the most recent strategy document.
    /// Env: CHECKGEN_STRATEGY_PATH
    pub strategy_path: PathBuf,

    #[clap(
        long,
        default_value = "http://localhost:5173",
        env = "CHECKGEN_CORS_ORIGIN"
    )]
    /// Browser origin allowed to call the API.
    /// Env: CHECKGEN_CORS_ORIGIN
    pub cors_origin: String,

    #[clap(long, default_value_t = crate::constants::DEFAULT_MAX_UPLOAD_BYTES, env = "CHECKGEN_MAX_UPLOAD_BYTES")]
    /// Maximum request body size in bytes.
    /// Env: CHECKGEN_MAX_UPLOAD_BYTES
    pub max_upload_bytes: usize,

    #[clap(long, env = "GEMINISTUDIOKEY", hide_env_values = true)]
    /// Gemini API key. Env: GEMINISTUDIOKEY
    pub gemini_api_key: Option<String>,

    #[clap(long, default_value = crate::constants::DEFAULT_MODEL, env = "CHECKGEN_MODEL")]
    /// Gemini model name. Env: CHECKGEN_MODEL
    pub model: String,

    #[clap(long, default_value = crate::constants::DEFAULT_API_BASE, env = "CHECKGEN_API_BASE")]
    /// Gemini API base URL. Env: CHECKGEN_API_BASE
    pub api_base: String,
}
