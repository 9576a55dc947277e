use crate::{
    dispatcher::KeyDispatcher, error::AppError, models::ShortenResponse, token::TokenGenerator,
};
use std::sync::Arc;
use url::Url;

/// Shortening and resolution on top of the key dispatcher.
#[derive(Clone)]
pub struct ShortenerService {
    dispatcher: KeyDispatcher,
    generator: Arc<dyn TokenGenerator>,
    collision_retries: u32,
}

impl ShortenerService {
    pub fn new(
        dispatcher: KeyDispatcher,
        generator: Arc<dyn TokenGenerator>,
        collision_retries: u32,
    ) -> Self {
        Self {
            dispatcher,
            generator,
            collision_retries,
        }
    }

    #[cfg(test)]
    pub fn dispatcher(&self) -> &KeyDispatcher {
        &self.dispatcher
    }

    /// Validate `url`, assign it a fresh token and return both the original
    /// and the public short link under `base` (`{scheme}://{host}`).
    pub async fn shorten(&self, url: &str, base: &str) -> Result<ShortenResponse, AppError> {
        validate_url(url, base)?;

        let token = self.assign_token(url).await?;
        tracing::info!("Shortened {} as {}", url, token);
        tracing::debug!("{} slot(s) live", self.dispatcher.slot_count());

        Ok(ShortenResponse {
            original: url.to_owned(),
            shortened: format!("{}/go/{}", base.trim_end_matches('/'), token),
        })
    }

    /// Look up the URL stored for `token`, ready to be used as a redirect
    /// target.
    pub async fn resolve(&self, token: &str) -> Result<String, AppError> {
        match self.dispatcher.get(token).await? {
            Some(record) => redirect_target(token, &record.full_url),
            None => Err(AppError::NotFound(token.to_owned())),
        }
    }

    async fn assign_token(&self, url: &str) -> Result<String, AppError> {
        // Without retries the generator's collision odds are trusted and the
        // record is written blindly, last writer wins.
        if self.collision_retries == 0 {
            let token = self.generator.generate();
            self.dispatcher.put(&token, url).await?;
            return Ok(token);
        }

        let attempts = self.collision_retries + 1;
        for _ in 0..attempts {
            let token = self.generator.generate();
            if self.dispatcher.put_if_absent(&token, url).await? {
                return Ok(token);
            }
            tracing::warn!("Token '{}' already taken, regenerating", token);
        }
        Err(AppError::TokenExhausted(attempts))
    }
}

/// Reject anything that is empty or not a well-formed absolute URL.
pub fn validate_url(url: &str, base: &str) -> Result<(), AppError> {
    let well_formed = !url.trim().is_empty()
        && !url.chars().any(char::is_whitespace)
        && Url::parse(url).is_ok();

    if well_formed {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "The URL query string is required and needs to be well formed.\n\
             Consider, {}/shorten?url=https://www.example.com.",
            base.trim_end_matches('/')
        )))
    }
}

/// Serialized form of the stored URL: control bytes and non-ASCII path
/// characters percent-encoded, hosts in punycode. Stored URLs without a
/// scheme are sent to `http://`.
fn redirect_target(token: &str, full_url: &str) -> Result<String, AppError> {
    Url::parse(full_url)
        .or_else(|_| Url::parse(&format!("http://{full_url}")))
        .map(String::from)
        .map_err(|_| AppError::InvalidTarget(token.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::token::HexTokenGenerator;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BASE: &str = "http://localhost:5000";

    fn service() -> ShortenerService {
        let dispatcher = KeyDispatcher::new(Arc::new(MemoryStore::new()));
        ShortenerService::new(dispatcher, Arc::new(HexTokenGenerator), 0)
    }

    /// Hands out tokens from a fixed list, repeating the last one.
    struct ScriptedGenerator {
        tokens: Vec<&'static str>,
        next: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(tokens: Vec<&'static str>) -> Self {
            Self {
                tokens,
                next: AtomicUsize::new(0),
            }
        }
    }

    impl TokenGenerator for ScriptedGenerator {
        fn generate(&self) -> String {
            let i = self.next.fetch_add(1, Ordering::SeqCst);
            self.tokens[i.min(self.tokens.len() - 1)].to_owned()
        }
    }

    fn token_of(shortened: &str) -> &str {
        shortened.rsplit('/').next().unwrap()
    }

    #[tokio::test]
    async fn shorten_then_resolve() {
        let svc = service();
        let res = svc.shorten("https://example.com/page", BASE).await.unwrap();

        assert_eq!(res.original, "https://example.com/page");
        assert!(res.shortened.starts_with("http://localhost:5000/go/"));

        let target = svc.resolve(token_of(&res.shortened)).await.unwrap();
        assert_eq!(target, "https://example.com/page");
    }

    #[tokio::test]
    async fn empty_url_is_rejected_without_side_effects() {
        let svc = service();
        for url in ["", "   "] {
            let err = svc.shorten(url, BASE).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(svc.dispatcher().slot_count(), 0);
    }

    #[tokio::test]
    async fn malformed_url_is_rejected() {
        let svc = service();
        for url in ["not a url", "example.com/page", "/relative/path", "http://"] {
            let err = svc.shorten(url, BASE).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "accepted {url:?}");
        }
        assert_eq!(svc.dispatcher().slot_count(), 0);
    }

    #[test]
    fn validation_message_points_at_base() {
        let err = validate_url("", "https://go.example.com/").unwrap_err();
        assert!(err
            .to_string()
            .contains("https://go.example.com/shorten?url=https://www.example.com"));
    }

    #[tokio::test]
    async fn same_url_twice_gets_two_tokens() {
        let svc = service();
        let a = svc.shorten("https://example.com/same", BASE).await.unwrap();
        let b = svc.shorten("https://example.com/same", BASE).await.unwrap();

        assert_ne!(a.shortened, b.shortened);
        for res in [a, b] {
            let target = svc.resolve(token_of(&res.shortened)).await.unwrap();
            assert_eq!(target, "https://example.com/same");
        }
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let err = service().resolve("nonexistent-token").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(t) if t == "nonexistent-token"));
    }

    #[tokio::test]
    async fn schemeless_record_redirects_over_http() {
        let svc = service();
        svc.dispatcher()
            .put("LEGACY", "example.com/old")
            .await
            .unwrap();

        assert_eq!(svc.resolve("LEGACY").await.unwrap(), "http://example.com/old");
    }

    #[tokio::test]
    async fn resolve_returns_encoded_ascii_target() {
        let svc = service();
        svc.dispatcher()
            .put("RAW", "https://exämple.com/ü\u{1}x")
            .await
            .unwrap();

        let target = svc.resolve("RAW").await.unwrap();
        assert!(target.is_ascii(), "not ascii: {target:?}");
        assert!(target.starts_with("https://xn--"));
        assert!(target.ends_with("/%C3%BC%01x"));
    }

    #[tokio::test]
    async fn unparseable_record_is_an_invalid_target() {
        let svc = service();
        svc.dispatcher().put("BROKEN", "bad host.example").await.unwrap();

        let err = svc.resolve("BROKEN").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTarget(t) if t == "BROKEN"));
    }

    #[tokio::test]
    async fn collision_without_retries_overwrites() {
        let dispatcher = KeyDispatcher::new(Arc::new(MemoryStore::new()));
        let svc = ShortenerService::new(
            dispatcher,
            Arc::new(ScriptedGenerator::new(vec!["DUP"])),
            0,
        );

        svc.shorten("https://first.example.com", BASE).await.unwrap();
        svc.shorten("https://second.example.com", BASE).await.unwrap();

        assert_eq!(svc.resolve("DUP").await.unwrap(), "https://second.example.com/");
    }

    #[tokio::test]
    async fn collision_with_retries_regenerates() {
        let dispatcher = KeyDispatcher::new(Arc::new(MemoryStore::new()));
        let svc = ShortenerService::new(
            dispatcher,
            Arc::new(ScriptedGenerator::new(vec!["DUP", "DUP", "FRESH"])),
            2,
        );

        let first = svc.shorten("https://first.example.com", BASE).await.unwrap();
        assert_eq!(token_of(&first.shortened), "DUP");

        let second = svc.shorten("https://second.example.com", BASE).await.unwrap();
        assert_eq!(token_of(&second.shortened), "FRESH");
        assert_eq!(svc.resolve("DUP").await.unwrap(), "https://first.example.com/");
    }

    #[tokio::test]
    async fn collision_retries_run_out() {
        let dispatcher = KeyDispatcher::new(Arc::new(MemoryStore::new()));
        let svc = ShortenerService::new(
            dispatcher,
            Arc::new(ScriptedGenerator::new(vec!["DUP"])),
            1,
        );

        svc.shorten("https://first.example.com", BASE).await.unwrap();
        let err = svc.shorten("https://second.example.com", BASE).await.unwrap_err();
        assert!(matches!(err, AppError::TokenExhausted(2)));
    }
}
