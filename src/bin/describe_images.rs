//! Sends a handful of images and a prompt to Gemini and prints the raw reply.
//!
//! Handy for checking the API key and model before starting the server:
//!   describe_images temp_uploads/image1.png temp_uploads/image2.png

use anyhow::{Context, Result};
use checkgen::config::ModelConfig;
use checkgen::constants::{DEFAULT_API_BASE, DEFAULT_MODEL};
use checkgen::gemini::GeminiClient;
use checkgen::model::{ImageInput, InstructionModel};
use clap::Parser;
use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "describe_images")]
#[command(about = "Ask Gemini what it sees in some images")]
struct Args {
    /// Images to send, in order
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Prompt sent ahead of the images
    #[arg(long, default_value = "What do you see in these images?")]
    prompt: String,

    /// Gemini API key
    #[arg(required = true, long, env = "GEMINISTUDIOKEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Model name
    #[arg(long, default_value = DEFAULT_MODEL, env = "CHECKGEN_MODEL")]
    model: String,

    /// API base URL
    #[arg(long, default_value = DEFAULT_API_BASE, env = "CHECKGEN_API_BASE")]
    api_base: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut images = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let image = ImageInput::load(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?;
        images.push(image);
    }

    let client = GeminiClient::new(ModelConfig {
        api_key: Some(args.gemini_api_key),
        model: args.model,
        api_base: Url::parse(&args.api_base).context("Invalid --api-base")?,
    });

    let text = client
        .generate_json(&args.prompt, &images)
        .await
        .context("Gemini request failed")?;
    println!("{text}");
    Ok(())
}
