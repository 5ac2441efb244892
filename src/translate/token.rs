//! OAuth2 service-account tokens for the translation API.
//!
//! A signed JWT assertion is exchanged for a bearer token, which is cached
//! until the translation API rejects it.

use super::{TokenError, TokenProvider};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

pub const DEFAULT_TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v4/token";
pub const TRANSLATION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-translation";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion
const ASSERTION_TTL_SECS: i64 = 3600;

/// Performs one network exchange for a fresh bearer token
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> Result<String, TokenError>;
}

type Refresh = Shared<BoxFuture<'static, Result<String, TokenError>>>;

#[derive(Default)]
struct TokenSlot {
    cached: Option<String>,
    in_flight: Option<Refresh>,
}

/// Process-wide token cache with single-flight refresh.
///
/// Callers that arrive while a refresh is running await the same exchange
/// and all observe its result, success or failure.
pub struct TokenCache {
    exchange: Arc<dyn TokenExchange>,
    slot: Mutex<TokenSlot>,
}

impl TokenCache {
    pub fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            slot: Mutex::new(TokenSlot::default()),
        }
    }

    pub async fn get(&self) -> Result<String, TokenError> {
        let refresh = {
            let mut slot = self.slot.lock().await;
            if let Some(token) = &slot.cached {
                return Ok(token.clone());
            }

            match &slot.in_flight {
                Some(refresh) => refresh.clone(),
                None => {
                    tracing::debug!("Fetching new access token");
                    let exchange = self.exchange.clone();
                    let refresh = async move { exchange.exchange().await }.boxed().shared();
                    slot.in_flight = Some(refresh.clone());
                    refresh
                }
            }
        };

        let result = refresh.clone().await;

        // First waiter back publishes the outcome
        let mut slot = self.slot.lock().await;
        if slot
            .in_flight
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&refresh))
        {
            slot.in_flight = None;
            match &result {
                Ok(token) => slot.cached = Some(token.clone()),
                Err(e) => tracing::error!("Access token fetch failed: {}", e),
            }
        }

        result
    }

    pub async fn invalidate(&self) {
        if self.slot.lock().await.cached.take().is_some() {
            tracing::debug!("Access token invalidated");
        }
    }

    pub async fn is_cached(&self) -> bool {
        self.slot.lock().await.cached.is_some()
    }
}

#[async_trait]
impl TokenProvider for TokenCache {
    async fn get(&self) -> Result<String, TokenError> {
        TokenCache::get(self).await
    }

    async fn invalidate(&self) {
        TokenCache::invalidate(self).await
    }
}

/// Service-account credentials file (only the fields we need)
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl ServiceAccount {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents).map_err(std::io::Error::other)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
}

impl TokenResponse {
    /// Value for the `Authorization` header, e.g. `Bearer ya29...`
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Exchanges an RS256-signed assertion for a bearer token
pub struct ServiceAccountExchange {
    client_email: String,
    key: EncodingKey,
    token_url: String,
    client: reqwest::Client,
}

impl ServiceAccountExchange {
    /// Fails if the private key is not a valid RSA PEM
    pub fn new(account: &ServiceAccount, token_url: String) -> Result<Self, TokenError> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TokenError::Request(e.to_string()))?;

        Ok(Self {
            client_email: account.client_email.clone(),
            key,
            token_url,
            client,
        })
    }

    fn assertion(&self, now: i64) -> Result<String, TokenError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: TRANSLATION_SCOPE,
            aud: &self.token_url,
            exp: now + ASSERTION_TTL_SECS,
            iat: now,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

#[async_trait]
impl TokenExchange for ServiceAccountExchange {
    async fn exchange(&self) -> Result<String, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TokenError::Signing(e.to_string()))?
            .as_secs() as i64;
        let assertion = self.assertion(now)?;

        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| TokenError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TokenError::Status(response.status().as_u16()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| TokenError::Parse(e.to_string()))?;

        tracing::info!(token_type = %token.token_type, "Obtained access token");
        Ok(token.authorization())
    }
}
