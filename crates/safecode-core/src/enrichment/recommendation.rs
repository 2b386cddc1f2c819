// SPDX-License-Identifier: Apache-2.0

//! Remote recommendation service client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::Result;
use crate::config::EnrichmentConfig;
use crate::finding::Finding;

/// Request body: every finding of the session.
#[derive(Debug, Serialize)]
pub struct RecommendationRequest<'a> {
    /// Findings in camelCase form.
    pub issues: &'a [Finding],
}

/// Response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    /// Refined recommendations keyed by definition id.
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

/// Recommendations for one definition id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Numeric definition id.
    pub id: u32,
    /// Category echoed by the service.
    #[serde(rename = "type", default)]
    pub category: String,
    /// Replacement recommendation texts.
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Source of refined recommendations.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Returns recommendations for a batch of findings.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status, or a
    /// malformed response. Callers treat every error as "no enrichment".
    async fn recommend(&self, findings: &[Finding]) -> Result<RecommendationResponse>;
}

/// HTTP client for the recommendation service.
///
/// One bounded-timeout POST per batch, no retries.
#[derive(Debug, Clone)]
pub struct HttpRecommendationService {
    url: String,
    http: Client,
}

impl HttpRecommendationService {
    /// Creates a client for `url` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns `SafeCodeError::Network` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    /// Creates a client from configuration, or `None` when no URL is set.
    ///
    /// # Errors
    ///
    /// Same as [`HttpRecommendationService::new`].
    pub fn from_config(config: &EnrichmentConfig) -> Result<Option<Self>> {
        config
            .recommendation_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| Self::new(url, Duration::from_secs(config.timeout_seconds)))
            .transpose()
    }

    /// Service endpoint.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RecommendationService for HttpRecommendationService {
    #[instrument(skip(self, findings), fields(url = %self.url, findings = findings.len()))]
    async fn recommend(&self, findings: &[Finding]) -> Result<RecommendationResponse> {
        let response = self
            .http
            .post(&self.url)
            .json(&RecommendationRequest { issues: findings })
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let parsed: RecommendationResponse = serde_json::from_str(&body)?;
        debug!(
            recommendations = parsed.recommendations.len(),
            "Received recommendations"
        );
        Ok(parsed)
    }
}
