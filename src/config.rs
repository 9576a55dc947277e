use anyhow::{Context, Result};
use std::path::PathBuf;

/// Where records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Durable SQLite file (default).
    Sqlite,
    /// Process memory only. Every record is lost on restart.
    Memory,
}

/// How new tokens are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStyle {
    /// Up to 8 uppercase hex characters.
    Hex,
    /// `token_length` characters from `[a-zA-Z0-9]`.
    Alphanumeric,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,

    pub storage: StorageBackend,

    /// SQLite connection string, e.g. "sqlite:./gograin.db". Ignored for the
    /// memory backend.
    pub database_url: String,

    /// Public base URL used when building shortened links, e.g.
    /// "https://go.example.com". When unset, the scheme and host of each
    /// incoming request are used instead. Never has a trailing slash.
    pub public_base_url: Option<String>,

    /// Directory holding the landing page `index.html`.
    pub static_dir: PathBuf,

    pub token_style: TokenStyle,

    /// Length of alphanumeric tokens.
    pub token_length: usize,

    /// How many times to regenerate a token that is already taken. Zero
    /// skips the existence check entirely.
    pub collision_retries: u32,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = get("PORT")
            .unwrap_or_else(|| "5000".into())
            .parse::<u16>()
            .context("PORT must be a valid port number (1–65535)")?;

        let storage = match get("STORAGE_BACKEND")
            .unwrap_or_else(|| "sqlite".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "sqlite" => StorageBackend::Sqlite,
            "memory" => StorageBackend::Memory,
            other => anyhow::bail!("STORAGE_BACKEND must be 'sqlite' or 'memory', got '{other}'"),
        };

        let token_style = match get("TOKEN_STYLE")
            .unwrap_or_else(|| "hex".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "hex" => TokenStyle::Hex,
            "alphanumeric" => TokenStyle::Alphanumeric,
            other => anyhow::bail!("TOKEN_STYLE must be 'hex' or 'alphanumeric', got '{other}'"),
        };

        let token_length = get("TOKEN_LENGTH")
            .unwrap_or_else(|| "7".into())
            .parse::<usize>()
            .context("TOKEN_LENGTH must be a positive integer")?;
        if token_length == 0 {
            anyhow::bail!("TOKEN_LENGTH must be greater than zero");
        }

        let collision_retries = get("TOKEN_COLLISION_RETRIES")
            .unwrap_or_else(|| "0".into())
            .parse::<u32>()
            .context("TOKEN_COLLISION_RETRIES must be a non-negative integer")?;

        let public_base_url = get("PUBLIC_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty());

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            storage,
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite:./gograin.db".into()),
            public_base_url,
            static_dir: get("STATIC_DIR")
                .unwrap_or_else(|| "./wwwroot".into())
                .into(),
            token_style,
            token_length,
            collision_retries,
        })
    }
}
