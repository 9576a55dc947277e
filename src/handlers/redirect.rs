use crate::{error::AppError, AppState};
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// GET /go/:token
///
/// Resolves the token through its slot and answers with 302 Found. Unknown
/// tokens get a 404; storage failures and unusable stored URLs a 500.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let target = state.service.resolve(&token).await?;
    tracing::debug!("Redirecting {} -> {}", token, target);

    let location =
        HeaderValue::try_from(target).map_err(|_| AppError::InvalidTarget(token.clone()))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
