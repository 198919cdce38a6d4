use super::prelude::*;
use crate::scratch::ScratchBatch;

#[derive(Serialize, Debug)]
pub(crate) struct InstructionsResponse {
    pub(crate) instructions: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct ModificationsResponse {
    pub(crate) modifications: String,
}

fn multipart_or_bad_request(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Multipart, CheckgenError> {
    multipart.map_err(|rejection| CheckgenError::InvalidInput(rejection.body_text()))
}

/// handles POST /generate_instructions
#[instrument(skip_all)]
pub(crate) async fn generate_instructions_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<InstructionsResponse>, CheckgenError> {
    info!("Processing images");
    let mut multipart = multipart_or_bad_request(multipart)?;

    let mut batch = state.scratch.batch();
    let result = generate_with_batch(&state, &mut multipart, &mut batch).await;
    batch.cleanup().await;

    result.map(|instructions| Json(InstructionsResponse { instructions }))
}

async fn generate_with_batch(
    state: &AppState,
    multipart: &mut Multipart,
    batch: &mut ScratchBatch,
) -> Result<String, CheckgenError> {
    let mut context = String::new();
    let mut saw_image_field = false;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == CONTEXT_FIELD {
            context = field.text().await?;
            continue;
        }
        if !field_name.starts_with(IMAGE_FIELD_PREFIX) {
            continue;
        }
        saw_image_field = true;

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            debug!("Skipping {} with no filename", field_name);
            continue;
        }
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            debug!("Skipping empty upload {}", file_name);
            continue;
        }
        batch.save(&file_name, &bytes).await?;
    }

    if !saw_image_field {
        return Err(CheckgenError::InvalidInput("No images provided".to_string()));
    }
    if batch.is_empty() {
        return Err(CheckgenError::InvalidInput(
            "No valid images provided".to_string(),
        ));
    }

    let instructions = state
        .generator
        .generate_from_images(&context, batch.paths())
        .await?;
    state.strategy.save(&instructions).await?;
    Ok(instructions)
}

#[derive(Deserialize, Debug)]
pub(crate) struct ImprovementForm {
    #[serde(rename = "improvementContext", default)]
    improvement_context: String,
}

/// Pulls `improvementContext` out of a multipart or urlencoded body.
///
/// The field is optional, so a missing body or any other content type
/// yields an empty context.
async fn improvement_context(request: Request) -> Result<String, CheckgenError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = multipart_or_bad_request(Multipart::from_request(request, &()).await)?;
        // previousInstructions is also sent by the frontend, the stored copy wins
        let mut context = String::new();
        while let Some(field) = multipart.next_field().await? {
            if field.name() == Some(IMPROVEMENT_CONTEXT_FIELD) {
                context = field.text().await?;
            }
        }
        Ok(context)
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(form) = Form::<ImprovementForm>::from_request(request, &())
            .await
            .map_err(|rejection| CheckgenError::InvalidInput(rejection.body_text()))?;
        Ok(form.improvement_context)
    } else {
        debug!("No form body on improve request, using empty context");
        Ok(String::new())
    }
}

/// handles POST /improve_instructions
#[instrument(skip_all)]
pub(crate) async fn improve_instructions_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ModificationsResponse>, CheckgenError> {
    if !state.strategy.exists().await? {
        return Err(no_strategy());
    }
    let context = improvement_context(request).await?;
    info!("Improvement context: {}", context);

    let generator = state.generator.clone();
    let modifications = state
        .strategy
        .update(|current| async move { generator.suggest_modifications(&current, &context).await })
        .await?
        .ok_or_else(no_strategy)?;

    Ok(Json(ModificationsResponse { modifications }))
}

fn no_strategy() -> CheckgenError {
    CheckgenError::InvalidInput("No existing strategy found".to_string())
}
