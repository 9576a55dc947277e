use crate::{error::AppError, handlers::request_base, models::ShortenResponse, AppState};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ShortenQuery {
    url: Option<String>,
}

/// GET /shorten?url=...
///
/// A missing `url` parameter is treated like an empty one and rejected with
/// 400 before any token is generated.
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ShortenQuery>,
) -> Result<Json<ShortenResponse>, AppError> {
    let base = request_base(&state, &headers);
    let url = query.url.unwrap_or_default();

    let response = state.service.shorten(&url, &base).await?;
    Ok(Json(response))
}
