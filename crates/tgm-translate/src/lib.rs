//! Google Translate adapter.
//!
//! Talks to the public `translate_a/single` endpoint (`client=gtx`), which
//! answers with nested arrays: `[[["Hello","Привет",...], ...], ...]`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use tgm_core::{config::Config, errors::Error, ports::TranslationService, Result};

#[derive(Clone, Debug)]
pub struct GoogleTranslator {
    endpoint: String,
    http: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Translation(format!("http client build failed: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.translate_endpoint.clone(), cfg.translation_timeout)
    }
}

#[async_trait]
impl TranslationService for GoogleTranslator {
    async fn translate(&self, text: &str, source_lang: &str, dest_lang: &str) -> Result<String> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", dest_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| Error::Translation(format!("request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Translation(format!(
                "translate failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::Translation(format!("json error: {e}")))?;

        let out = parse_translation(&v)?;
        debug!(chars = out.chars().count(), "translation received");
        Ok(out)
    }
}

/// Join the translated segments of a `translate_a/single` response.
pub fn parse_translation(v: &serde_json::Value) -> Result<String> {
    let segments = v
        .get(0)
        .and_then(|s| s.as_array())
        .ok_or_else(|| Error::Translation("unexpected response shape".to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(Error::Translation(
            "translate returned empty text".to_string(),
        ));
    }
    Ok(text)
}
