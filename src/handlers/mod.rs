pub mod redirect;
pub mod shorten;

use crate::AppState;
use axum::http::{header, HeaderMap};

/// `{scheme}://{host}` that short links should be built under.
///
/// A configured `PUBLIC_BASE_URL` wins. Otherwise the request's own `Host`
/// header is used, with the scheme taken from `X-Forwarded-Proto` when a
/// proxy set it.
pub fn request_base(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.public_base_url {
        return base.clone();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{}:{}", state.config.host, state.config.port));

    format!("{scheme}://{host}")
}
