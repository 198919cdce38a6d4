//! Shared constants for the service
//!

/// Default Gemini model used for both generation and refinement
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default base URL of the Gemini REST API
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header Gemini reads the API key from
pub const GEMINI_API_KEY_HEADER: &str = "x-goog-api-key";

/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINISTUDIOKEY";

/// Multipart field carrying the free-text context for generation
pub const CONTEXT_FIELD: &str = "context";

/// Multipart field carrying the free-text context for refinement
pub const IMPROVEMENT_CONTEXT_FIELD: &str = "improvementContext";

/// Prefix of the indexed image fields, eg `image0`, `image1`
pub const IMAGE_FIELD_PREFIX: &str = "image";

/// Length of the random token prepended to scratch file names
pub const SCRATCH_TOKEN_LENGTH: usize = 32;

/// Name used when a sanitised upload filename ends up empty
pub const FALLBACK_UPLOAD_NAME: &str = "upload";

/// Default request body limit, generous enough for a handful of screenshots
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// JSON shape the model is asked to return
pub const JSON_FORMAT: &str = r#"
{
  "features": [
    {
      "description": string,
      "pre_conditions": string,
      "steps": [string, string, ...],
      "expected_results": [string, string,]
    },
    ...
  ]
}
"#;

#[cfg(test)]
/// Context string used in tests
pub const TEST_CONTEXT: &str = "Login page for the admin portal";
