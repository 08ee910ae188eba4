//! UDPipe REST client
//!
//! Sends raw text to a UDPipe 2 service and parses the CoNLL-U it returns.
//! See <https://lindat.mff.cuni.cz/services/udpipe/api-reference.php>.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use depmatch_core::{Annotator, AnnotatorConfig, Doc};

use crate::{parse_conllu, ParserError, Result};

/// UDPipe annotation client
pub struct UdpipeAnnotator {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct UdpipeResponse {
    model: Option<String>,
    result: String,
}

impl UdpipeAnnotator {
    /// Create a client for a service URL and model
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &AnnotatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ParserError::Http(format!("Failed to build client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.udpipe_url.trim_end_matches('/').to_string(),
            model: config.udpipe_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Turn a service response body into a single document for `text`
    pub fn parse_response(body: &str, text: &str) -> Result<Doc> {
        let response: UdpipeResponse = serde_json::from_str(body)
            .map_err(|e| ParserError::Http(format!("Failed to parse response: {e}")))?;
        if let Some(model) = &response.model {
            tracing::debug!(model = %model, "UDPipe response received");
        }

        let documents = parse_conllu(&response.result)?;
        if documents.is_empty() {
            return Err(ParserError::EmptyInput);
        }

        let mut doc = Doc::concat(documents);
        doc.text = text.to_string();
        Ok(doc)
    }

    async fn process(&self, text: &str) -> Result<String> {
        let params = [
            ("model", self.model.as_str()),
            ("tokenizer", ""),
            ("tagger", ""),
            ("parser", ""),
            ("data", text),
        ];

        let response = self
            .client
            .post(format!("{}/process", self.base_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| ParserError::Http(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ParserError::Http(format!(
                "UDPipe returned {status}: {error_text}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ParserError::Http(format!("Failed to read response: {e}")))
    }
}

#[async_trait]
impl Annotator for UdpipeAnnotator {
    async fn annotate(&self, text: &str) -> depmatch_core::Result<Doc> {
        if text.trim().is_empty() {
            return Err(ParserError::EmptyInput.into());
        }

        tracing::debug!(model = %self.model, "Annotating with UDPipe: {}", text);
        let body = self.process(text).await?;
        Ok(Self::parse_response(&body, text)?)
    }

    fn name(&self) -> &str {
        "udpipe"
    }
}
