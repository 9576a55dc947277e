use serde::Serialize;

/// A persisted token → URL mapping from the `url_records` table.
///
/// `token` duplicates the storage key so rows are self-describing; the key is
/// authoritative.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UrlRecord {
    pub token: String,
    pub full_url: String,
}

impl UrlRecord {
    pub fn new(token: impl Into<String>, full_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            full_url: full_url.into(),
        }
    }
}

/// JSON body returned by `GET /shorten`.
#[derive(Debug, Clone, Serialize)]
pub struct ShortenResponse {
    pub original: String,
    pub shortened: String,
}
