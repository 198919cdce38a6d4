//! Client for Gemini's `generateContent` REST endpoint.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::config::ModelConfig;
use crate::constants::{GEMINI_API_KEY_ENV, GEMINI_API_KEY_HEADER};
use crate::error::CheckgenError;
use crate::model::{ImageInput, InstructionModel};

/// Request body for POST /models/{model}:generateContent
#[derive(Serialize, Debug)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize, Debug)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize, Debug)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Talks to a hosted Gemini model.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl GeminiClient {
    /// Builds a client; nothing is sent until the first request.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Full URL of the generateContent call for the configured model
    pub fn endpoint(&self) -> Result<Url, CheckgenError> {
        let base = self.config.api_base.as_str().trim_end_matches('/');
        let model = self
            .config
            .model
            .strip_prefix("models/")
            .unwrap_or(&self.config.model);
        Ok(Url::parse(&format!(
            "{base}/models/{model}:generateContent"
        ))?)
    }

    fn api_key(&self) -> Result<&str, CheckgenError> {
        self.config.api_key.as_deref().ok_or_else(|| {
            CheckgenError::Upstream(format!(
                "Gemini API key is not configured, set {GEMINI_API_KEY_ENV}"
            ))
        })
    }
}

fn build_request<'a>(prompt: &'a str, images: &[ImageInput]) -> GenerateContentRequest<'a> {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(Part::Text { text: prompt });
    parts.extend(images.iter().map(|image| Part::InlineData {
        inline_data: InlineData {
            mime_type: image.mime_type,
            data: general_purpose::STANDARD.encode(&image.data),
        },
    }));
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
        },
    }
}

/// Joins the text parts of the first candidate that has any.
fn response_text(parsed: GenerateContentResponse) -> Result<String, CheckgenError> {
    if let Some(err) = parsed.error {
        return Err(CheckgenError::Upstream(format!(
            "Gemini API returned error: {err}"
        )));
    }
    parsed
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .find(|text| !text.is_empty())
        .ok_or_else(|| CheckgenError::Upstream("Gemini response contained no text".to_string()))
}

#[async_trait]
impl InstructionModel for GeminiClient {
    async fn generate_json(
        &self,
        prompt: &str,
        images: &[ImageInput],
    ) -> Result<String, CheckgenError> {
        let api_key = self.api_key()?;
        let url = self.endpoint()?;
        let body = build_request(prompt, images);

        info!(model = %self.config.model, images = images.len(), "Calling Gemini");
        let resp = self
            .http
            .post(url)
            .header(GEMINI_API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| CheckgenError::Upstream(format!("Request to Gemini failed: {err}")))?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|err| {
            CheckgenError::Upstream(format!("Failed reading Gemini response body: {err}"))
        })?;
        if !status.is_success() {
            return Err(CheckgenError::Upstream(format!(
                "Gemini API error {status}: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes).map_err(|err| {
            CheckgenError::Upstream(format!("Failed to parse Gemini response JSON: {err}"))
        })?;
        let text = response_text(parsed)?;
        debug!("Gemini returned {} bytes of text", text.len());
        Ok(text)
    }
}
