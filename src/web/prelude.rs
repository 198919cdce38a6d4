pub(crate) use crate::constants::{CONTEXT_FIELD, IMAGE_FIELD_PREFIX, IMPROVEMENT_CONTEXT_FIELD};
pub(crate) use crate::error::CheckgenError;
pub(crate) use crate::web::AppState;
pub(crate) use axum::Json;
pub(crate) use axum::extract::{Form, FromRequest, Multipart, Request, State};
pub(crate) use axum::extract::multipart::MultipartRejection;
pub(crate) use axum::http::header::CONTENT_TYPE;
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use tracing::{debug, info, instrument};
