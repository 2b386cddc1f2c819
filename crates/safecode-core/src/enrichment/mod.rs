// SPDX-License-Identifier: Apache-2.0

//! Post-detection enrichment.
//!
//! Performance impacts come from the local catalog and are mandatory.
//! Refined recommendations come from an optional remote service and are
//! best effort: any failure leaves findings as they were.

pub mod recommendation;

pub use recommendation::{
    HttpRecommendationService, Recommendation, RecommendationRequest, RecommendationResponse,
    RecommendationService,
};

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::Result;
use crate::catalog::{PerformanceCatalog, catalog_error};
use crate::finding::Finding;

/// Attaches the performance-impact entries of each finding's definition.
///
/// # Errors
///
/// Returns `SafeCodeError::Catalog` if a definition has no entry, since that
/// means the catalogs disagree.
pub fn attach_performance(catalog: &PerformanceCatalog, findings: &mut [Finding]) -> Result<()> {
    for finding in findings {
        let Some(id) = finding.definition_id.as_deref() else {
            continue;
        };
        let entries = catalog.get(id).ok_or_else(|| {
            catalog_error(
                "performance-impacts",
                format!("no entry for definition {id}"),
            )
        })?;
        finding.performance_impacts = entries.to_vec();
    }
    Ok(())
}

/// Replaces recommendations of findings whose numeric id the response covers.
///
/// Entries sharing an id are concatenated in response order. Findings the
/// response does not mention keep their recommendations.
pub fn merge_recommendations(findings: &mut [Finding], response: RecommendationResponse) {
    let mut by_id: HashMap<u32, Vec<String>> = HashMap::new();
    for entry in response.recommendations {
        by_id
            .entry(entry.id)
            .or_default()
            .extend(entry.recommendations);
    }

    for finding in findings {
        if let Some(recommendations) = finding
            .numeric_definition_id()
            .and_then(|id| by_id.get(&id))
        {
            finding.recommendations.clone_from(recommendations);
        }
    }
}

/// Fetches and merges remote recommendations.
///
/// Never fails: service errors are logged and the findings are left
/// untouched. Returns whether recommendations were merged.
pub async fn enrich_recommendations(
    service: &dyn RecommendationService,
    findings: &mut [Finding],
) -> bool {
    if findings.is_empty() {
        return false;
    }

    match service.recommend(findings).await {
        Ok(response) => {
            debug!(
                entries = response.recommendations.len(),
                "Merging recommendations"
            );
            merge_recommendations(findings, response);
            true
        }
        Err(e) => {
            warn!("Recommendation service unavailable, keeping catalog recommendations: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::catalog::Catalogs;
    use crate::error::SafeCodeError;

    fn finding(id: &str) -> Finding {
        Finding {
            definition_id: Some(id.to_string()),
            recommendations: vec!["catalog".to_string()],
            ..Finding::default()
        }
    }

    fn entry(id: u32, text: &str) -> Recommendation {
        Recommendation {
            id,
            category: String::new(),
            recommendations: vec![text.to_string()],
        }
    }

    #[test]
    fn test_attach_performance() {
        let catalogs = Catalogs::bundled().unwrap();
        let mut findings = vec![finding("101"), Finding::default()];
        attach_performance(&catalogs.performance, &mut findings).unwrap();

        assert!(!findings[0].performance_impacts.is_empty());
        assert!(findings[1].performance_impacts.is_empty());
    }

    #[test]
    fn test_missing_performance_entry_is_an_error() {
        let catalogs = Catalogs::bundled().unwrap();
        let mut findings = vec![finding("9999")];
        let err = attach_performance(&catalogs.performance, &mut findings).unwrap_err();
        assert!(matches!(err, SafeCodeError::Catalog { .. }));
    }

    #[test]
    fn test_merge_concatenates_duplicates() {
        let mut findings = vec![finding("101"), finding("102"), finding("abc")];
        merge_recommendations(
            &mut findings,
            RecommendationResponse {
                recommendations: vec![entry(101, "first"), entry(101, "second")],
            },
        );

        assert_eq!(findings[0].recommendations, vec!["first", "second"]);
        assert_eq!(findings[1].recommendations, vec!["catalog"]);
        assert_eq!(findings[2].recommendations, vec!["catalog"]);
    }

    struct Failing;

    #[async_trait]
    impl RecommendationService for Failing {
        async fn recommend(&self, _findings: &[Finding]) -> Result<RecommendationResponse> {
            Err(SafeCodeError::Config {
                message: "offline".to_string(),
            })
        }
    }

    struct Fixed(RecommendationResponse);

    #[async_trait]
    impl RecommendationService for Fixed {
        async fn recommend(&self, _findings: &[Finding]) -> Result<RecommendationResponse> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_service_failure_leaves_findings_unchanged() {
        let mut findings = vec![finding("101")];
        let before = findings.clone();

        assert!(!enrich_recommendations(&Failing, &mut findings).await);
        assert_eq!(findings, before);
    }

    #[tokio::test]
    async fn test_service_success_merges() {
        let service = Fixed(RecommendationResponse {
            recommendations: vec![entry(101, "Use PreparedStatement")],
        });
        let mut findings = vec![finding("101")];

        assert!(enrich_recommendations(&service, &mut findings).await);
        assert_eq!(findings[0].recommendations, vec!["Use PreparedStatement"]);
    }
}
