use std::time::Duration;

use async_trait::async_trait;
use litscope_core::config::CitationsConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::{Result, ScienceError};
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::sources::{CitationInfo, CitationSource};

pub const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";
const CITATION_FIELDS: &str = "title,citationCount";
const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

pub struct SemanticScholarSource {
    client: RateLimitedClient,
    api_key: Option<String>,
    base_url: String,
}

impl SemanticScholarSource {
    /// Build from config; the API key is read from the configured env var.
    pub fn from_config(config: &CitationsConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::with_params(
            &config.base_url,
            api_key,
            Duration::from_millis(config.min_interval_ms),
            config.max_retries,
        )
    }

    pub fn with_params(
        base_url: &str,
        api_key: Option<String>,
        min_interval: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, max_retries, USER_AGENT)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let value =
                HeaderValue::from_str(key).map_err(|e| ScienceError::Parse(e.to_string()))?;
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(headers)
    }

    fn paper_url(&self, doi: &str) -> String {
        format!(
            "{}/paper/DOI:{}?fields={CITATION_FIELDS}",
            self.base_url,
            urlencoding::encode(doi).replace("%2F", "/")
        )
    }
}

fn parse_paper(json: &Value) -> Result<CitationInfo> {
    let citation_count = json["citationCount"]
        .as_u64()
        .ok_or_else(|| ScienceError::Parse("missing citationCount in Semantic Scholar response".to_string()))?;
    Ok(CitationInfo {
        title: json["title"].as_str().map(str::to_string),
        citation_count,
    })
}

#[async_trait]
impl CitationSource for SemanticScholarSource {
    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    async fn citation_count(&self, doi: &str) -> Result<Option<CitationInfo>> {
        let url = self.paper_url(doi);
        match self
            .client
            .get_json_with_headers::<Value>(&url, self.auth_headers()?)
            .await
        {
            Ok(json) => parse_paper(&json).map(Some),
            Err(ScienceError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
