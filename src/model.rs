//! The seam between the service and whatever generative model backs it.

use std::path::Path;

use async_trait::async_trait;
use image::ImageFormat;
use tracing::debug;

use crate::error::CheckgenError;

/// An image ready to be sent to the model.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageInput {
    /// MIME type detected from the content, eg `image/png`
    pub mime_type: &'static str,
    /// Raw file bytes
    pub data: Vec<u8>,
}

impl ImageInput {
    /// Wraps raw bytes, rejecting anything that isn't a supported image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, CheckgenError> {
        let format = image::guess_format(&data).map_err(|err| {
            debug!("Failed to guess image format: {}", err);
            CheckgenError::InvalidInput("Unsupported or unreadable image".to_string())
        })?;
        let mime_type = match format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            other => {
                debug!("Rejecting image format {:?}", other);
                return Err(CheckgenError::InvalidInput(format!(
                    "Unsupported image format: {}",
                    other.to_mime_type()
                )));
            }
        };
        Ok(Self { mime_type, data })
    }

    /// Reads an image from disk.
    pub async fn load(path: &Path) -> Result<Self, CheckgenError> {
        let data = tokio::fs::read(path).await.map_err(|err| {
            CheckgenError::Storage(format!("Failed to read {}: {}", path.display(), err))
        })?;
        Self::from_bytes(data)
    }
}

/// A model that answers a text prompt, optionally with images, in JSON.
#[async_trait]
pub trait InstructionModel: Send + Sync {
    /// Sends one request and returns the raw response text.
    async fn generate_json(
        &self,
        prompt: &str,
        images: &[ImageInput],
    ) -> Result<String, CheckgenError>;
}
