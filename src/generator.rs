//! Turns context and screenshots into test instructions.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::CheckgenError;
use crate::model::{ImageInput, InstructionModel};
use crate::prompt::{clean_text, generation_prompt, improvement_prompt};

/// Builds prompts, calls the model and tidies up what comes back.
#[derive(Clone)]
pub struct InstructionGenerator {
    model: Arc<dyn InstructionModel>,
}

impl std::fmt::Debug for InstructionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructionGenerator").finish_non_exhaustive()
    }
}

impl InstructionGenerator {
    /// Wraps a model
    pub fn new(model: Arc<dyn InstructionModel>) -> Self {
        Self { model }
    }

    /// Asks for test cases covering the features in the screenshots.
    pub async fn generate_from_images(
        &self,
        context: &str,
        image_paths: &[PathBuf],
    ) -> Result<String, CheckgenError> {
        info!("Generating instructions from {} image(s)", image_paths.len());
        debug!("Context: {}", context);

        let result = async {
            let mut images = Vec::with_capacity(image_paths.len());
            for path in image_paths {
                images.push(ImageInput::load(path).await?);
            }
            let prompt = generation_prompt(context);
            self.model.generate_json(&prompt, &images).await
        }
        .await;

        match result {
            Ok(raw) => {
                let cleaned = clean_text(&raw);
                debug!("Instructions: {}", cleaned);
                Ok(cleaned)
            }
            Err(err) => {
                error!("Error generating instructions: {}", err);
                Err(err)
            }
        }
    }

    /// Asks for a revised version of an existing strategy.
    pub async fn suggest_modifications(
        &self,
        current_strategy: &str,
        context: &str,
    ) -> Result<String, CheckgenError> {
        info!("Suggesting modifications");
        debug!("Improvement context: {}", context);

        let prompt = improvement_prompt(current_strategy, context);
        match self.model.generate_json(&prompt, &[]).await {
            Ok(raw) => {
                let cleaned = clean_text(&raw);
                debug!("Modifications: {}", cleaned);
                Ok(cleaned)
            }
            Err(err) => {
                error!("Error suggesting modifications: {}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TEST_CONTEXT;
    use crate::model::testing::{FakeModel, PNG_BYTES};

    #[tokio::test]
    async fn generate_sends_every_image_and_cleans_the_reply() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");
        tokio::fs::write(&first, PNG_BYTES).await.expect("write");
        tokio::fs::write(&second, PNG_BYTES).await.expect("write");

        let model = Arc::new(FakeModel::with_replies(vec![Ok(
            "{\\n  \"features\": [] \n}".to_string()
        )]));
        let generator = InstructionGenerator::new(model.clone());
        let out = generator
            .generate_from_images(TEST_CONTEXT, &[first, second])
            .await
            .expect("generate");

        assert_eq!(out, "{ \"features\": [] }");
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].image_count, 2);
        assert!(calls[0].prompt.contains(TEST_CONTEXT));
    }

    #[tokio::test]
    async fn unreadable_image_stops_before_the_model() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model = Arc::new(FakeModel::with_replies(vec![Ok("{}".to_string())]));
        let generator = InstructionGenerator::new(model.clone());

        let err = generator
            .generate_from_images("", &[dir.path().join("missing.png")])
            .await
            .unwrap_err();
        assert!(matches!(err, CheckgenError::Storage(_)));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn modifications_are_text_only() {
        let model = Arc::new(FakeModel::with_replies(vec![Ok("  revised  ".to_string())]));
        let generator = InstructionGenerator::new(model.clone());
        let out = generator
            .suggest_modifications("{\"features\": []}", "cover logout")
            .await
            .expect("modify");

        assert_eq!(out, "revised");
        let calls = model.calls();
        assert_eq!(calls[0].image_count, 0);
        assert!(calls[0].prompt.contains("cover logout"));
        assert!(calls[0].prompt.contains("{\"features\": []}"));
    }

    #[tokio::test]
    async fn model_errors_propagate() {
        let model = Arc::new(FakeModel::with_replies(vec![Err(CheckgenError::Upstream(
            "quota exceeded".to_string(),
        ))]));
        let generator = InstructionGenerator::new(model);
        let err = generator.suggest_modifications("x", "y").await.unwrap_err();
        assert!(matches!(err, CheckgenError::Upstream(ref msg) if msg == "quota exceeded"));
    }
}
