use std::time::Duration;

use litscope_core::config::CrossRefConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ScienceError};
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::identifiers::doi::normalize_doi;

pub struct CrossRefSource {
    client: RateLimitedClient,
    base_url: String,
}

impl CrossRefSource {
    pub fn from_config(config: &CrossRefConfig) -> Result<Self> {
        Self::with_params(
            &config.base_url,
            Duration::from_millis(100),
            config.polite_email.clone(),
        )
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        polite_email: Option<String>,
    ) -> Result<Self> {
        let user_agent = match &polite_email {
            Some(email) => format!("{USER_AGENT} (mailto:{email})"),
            None => USER_AGENT.to_string(),
        };

        Ok(Self {
            client: RateLimitedClient::new(min_interval, 3, &user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_by_doi(&self, doi: &str) -> Result<CrossRefWork> {
        let url = format!(
            "{}/works/{}",
            self.base_url,
            urlencoding::encode(doi).replace("%2F", "/")
        );
        let val: Value = self.client.get_json(&url).await?;
        CrossRefWork::from_json(&val["message"])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRefWork {
    pub doi: String,
    /// DOIs as listed under `reference[].DOI`, unnormalized.
    pub references: Vec<String>,
}

impl CrossRefWork {
    pub fn from_json(v: &Value) -> Result<Self> {
        let doi = v["DOI"]
            .as_str()
            .ok_or_else(|| ScienceError::Parse("Missing DOI in CrossRef response".to_string()))?
            .to_string();

        let references = v["reference"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|r| r["DOI"].as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { doi, references })
    }

    /// Normalized DOIs of all references that carry one, sorted and deduplicated.
    pub fn reference_dois(&self) -> Vec<String> {
        let mut dois: Vec<String> = self
            .references
            .iter()
            .filter_map(|r| normalize_doi(r))
            .collect();
        dois.sort();
        dois.dedup();
        dois
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_crossref_fetch_by_doi() {
        let mut server = Server::new_async().await;
        let base_url = server.url();

        let _m = server
            .mock("GET", "/works/10.1038/nature14539")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "status": "ok",
                "message": {
                    "DOI": "10.1038/nature14539",
                    "title": ["Human-level control through deep reinforcement learning"],
                    "published-print": {"date-parts": [[2015, 2, 26]]},
                    "reference-count": 3,
                    "is-referenced-by-count": 9000,
                    "reference": [
                        {"key": "r1", "DOI": "10.1613/JAIR.3912"},
                        {"key": "r2", "unstructured": "Sutton, R. Reinforcement Learning. 1998"},
                        {"key": "r3", "DOI": "10.1038/nature14236"},
                        {"key": "r4", "DOI": "10.1613/jair.3912"}
                    ]
                }
            }"#,
            )
            .create_async()
            .await;

        let source = CrossRefSource::with_params(&base_url, Duration::from_secs(0), None).unwrap();
        let work = source.fetch_by_doi("10.1038/nature14539").await.unwrap();

        assert_eq!(work.doi, "10.1038/nature14539");
        assert_eq!(work.references.len(), 3);
        assert_eq!(
            work.reference_dois(),
            vec!["10.1038/nature14236".to_string(), "10.1613/jair.3912".to_string()]
        );
    }

    #[tokio::test]
    async fn test_crossref_unknown_doi() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/works/10.1/none")
            .with_status(404)
            .with_body("Resource not found.")
            .create_async()
            .await;

        let source = CrossRefSource::with_params(&server.url(), Duration::from_secs(0), None).unwrap();
        let err = source.fetch_by_doi("10.1/none").await.unwrap_err();
        assert!(matches!(err, ScienceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_crossref_doi_is_path_encoded() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/works/10.1000/a%23b%3Fc")
            .with_status(200)
            .with_body(r#"{"message": {"DOI": "10.1000/a#b?c"}}"#)
            .create_async()
            .await;

        let source = CrossRefSource::with_params(&server.url(), Duration::from_secs(0), None).unwrap();
        let work = source.fetch_by_doi("10.1000/a#b?c").await.unwrap();
        assert_eq!(work.doi, "10.1000/a#b?c");
        assert!(work.references.is_empty());
    }

    #[test]
    fn test_work_without_doi_is_parse_error() {
        let v: Value = serde_json::json!({"title": ["x"]});
        assert!(matches!(CrossRefWork::from_json(&v), Err(ScienceError::Parse(_))));
    }
}
