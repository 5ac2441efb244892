use super::{TranslateBackend, TranslateError, TranslateResult};
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_TRANSLATE_URL: &str =
    "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    format: &'a str,
    source: &'a str,
}

/// Cloud Translation v2 client (English to French)
pub struct GoogleTranslateBackend {
    url: String,
    client: reqwest::Client,
}

impl GoogleTranslateBackend {
    pub fn new(url: String) -> TranslateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| TranslateError::Request(e.to_string()))?;

        Ok(Self { url, client })
    }
}

/// Pull `data.translations[0].translatedText` out of a v2 response body
pub fn extract_translation(body: &serde_json::Value) -> TranslateResult<String> {
    body.pointer("/data/translations/0/translatedText")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| TranslateError::Parse(format!("No translatedText in response: {}", body)))
}

#[async_trait]
impl TranslateBackend for GoogleTranslateBackend {
    async fn translate(&self, authorization: &str, text: &str) -> TranslateResult<String> {
        let request = TranslateRequest {
            q: text,
            target: "fr",
            format: "text",
            source: "en",
        };

        let response = self
            .client
            .post(&self.url)
            .header(header::AUTHORIZATION, authorization)
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslateError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(TranslateError::Unauthorized),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), %body, "Translate call rejected");
                return Err(TranslateError::Status(status.as_u16()));
            }
            _ => {}
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;

        extract_translation(&body)
    }
}
