mod google;
mod token;

use async_trait::async_trait;
use std::sync::Arc;

pub use google::{extract_translation, GoogleTranslateBackend, DEFAULT_TRANSLATE_URL};
pub use token::{
    ServiceAccount, ServiceAccountExchange, TokenCache, TokenExchange, TokenResponse,
    DEFAULT_TOKEN_URL, TRANSLATION_SCOPE,
};

/// Result type for translation calls
pub type TranslateResult<T> = Result<T, TranslateError>;

/// Errors from acquiring an access token.
///
/// Cloneable so a single failed refresh can be handed to every caller that
/// was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenError {
    #[error("Token request failed: {0}")]
    Request(String),

    #[error("Token endpoint returned status: {0}")]
    Status(u16),

    #[error("Token response parsing failed: {0}")]
    Parse(String),

    #[error("Failed to sign token assertion: {0}")]
    Signing(String),
}

/// Errors that can occur during a translation call
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("No access token available: {0}")]
    Token(#[from] TokenError),

    /// The remote rejected our bearer token (HTTP 401)
    #[error("Translation request unauthorized")]
    Unauthorized,

    #[error("Translation API returned status: {0}")]
    Status(u16),

    #[error("Translation request failed: {0}")]
    Request(String),

    #[error("Response parsing failed: {0}")]
    Parse(String),
}

impl TranslateError {
    /// Whether another attempt with a fresh token may succeed
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, TranslateError::Unauthorized)
    }
}

/// Source of bearer credentials for the translation API
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a usable `Authorization` header value
    async fn get(&self) -> Result<String, TokenError>;

    /// Drop the current credential so the next `get` fetches a new one
    async fn invalidate(&self);
}

/// A remote service that translates English text
#[async_trait]
pub trait TranslateBackend: Send + Sync {
    async fn translate(&self, authorization: &str, text: &str) -> TranslateResult<String>;
}

/// Total attempts per translation, including the retry after a 401
const MAX_ATTEMPTS: usize = 2;

/// Translation with token refresh on expiry
pub struct TranslationClient {
    tokens: Arc<dyn TokenProvider>,
    backend: Arc<dyn TranslateBackend>,
}

impl TranslationClient {
    pub fn new(tokens: Arc<dyn TokenProvider>, backend: Arc<dyn TranslateBackend>) -> Self {
        Self { tokens, backend }
    }

    /// Translate, refreshing the token once if the remote reports it expired
    pub async fn try_translate(&self, text: &str) -> TranslateResult<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let token = self.tokens.get().await?;

            match self.backend.translate(&token, text).await {
                Err(e) if e.is_auth_expired() => {
                    self.tokens.invalidate().await;
                    if attempt >= MAX_ATTEMPTS {
                        return Err(e);
                    }
                    tracing::info!(attempt, "Translation token expired, refreshing");
                }
                other => return other,
            }
        }
    }

    /// Translate text, returning an empty string on any failure
    pub async fn translate(&self, text: &str) -> String {
        match self.try_translate(text).await {
            Ok(result) => {
                tracing::debug!(input = text, output = %result, "Translated");
                result
            }
            Err(e) => {
                tracing::warn!(input = text, "Translation failed: {}", e);
                String::new()
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_retry_after_unauthorized() {
        let tokens = Arc::new(CountingTokens::default());
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(TranslateError::Unauthorized),
            Ok("bonjour".to_string()),
        ]));
        let client = TranslationClient::new(tokens.clone(), backend.clone());

        assert_eq!(client.translate("hello").await, "bonjour");
        assert_eq!(tokens.invalidations.load(Ordering::SeqCst), 1);
        assert_eq!(backend.call_count(), 2);

        // The retry used a freshly fetched token
        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls[0].0, "Bearer token-0");
        assert_eq!(calls[1].0, "Bearer token-1");
    }

    #[tokio::test]
    async fn test_two_unauthorized_gives_empty() {
        let tokens = Arc::new(CountingTokens::default());
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(TranslateError::Unauthorized),
            Err(TranslateError::Unauthorized),
            Ok("never reached".to_string()),
        ]));
        let client = TranslationClient::new(tokens.clone(), backend.clone());

        assert_eq!(client.translate("hello").await, "");
        assert_eq!(backend.call_count(), 2);

        let err = client.try_translate("again").await;
        assert_eq!(err.unwrap(), "never reached");
    }

    #[tokio::test]
    async fn test_other_status_is_not_retried() {
        let tokens = Arc::new(CountingTokens::default());
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(TranslateError::Status(503)),
            Ok("unused".to_string()),
        ]));
        let client = TranslationClient::new(tokens.clone(), backend.clone());

        assert_eq!(client.translate("hello").await, "");
        assert_eq!(backend.call_count(), 1);
        assert_eq!(tokens.invalidations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_token_failure_is_soft() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok("unused".to_string())]));
        let client = TranslationClient::new(Arc::new(FailingTokens), backend.clone());

        let result = client.try_translate("hello").await;
        assert!(matches!(result, Err(TranslateError::Token(_))));
        assert_eq!(client.translate("hello").await, "");
        assert_eq!(backend.call_count(), 0);
    }
}
