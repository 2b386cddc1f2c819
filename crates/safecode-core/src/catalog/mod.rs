// SPDX-License-Identifier: Apache-2.0

//! Vulnerability and performance-impact catalogs.
//!
//! Both catalogs are loaded once, validated eagerly, and passed by reference
//! to the registry and every detector. Nothing here is global.

pub mod performance;
pub mod vulnerability;

pub use performance::{ImpactLevel, PerformanceCatalog, PerformanceImpactEntry};
pub use vulnerability::{VulnerabilityCatalog, VulnerabilityDefinition};

use serde::{Deserialize, Deserializer};

use crate::Result;
use crate::error::SafeCodeError;

/// The pair of catalogs a scan session reads from.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    /// Definition id to description, category and base recommendations.
    pub vulnerabilities: VulnerabilityCatalog,
    /// Definition id to ordered performance-impact entries.
    pub performance: PerformanceCatalog,
}

impl Catalogs {
    /// Loads both catalogs from the embedded resources.
    ///
    /// # Errors
    ///
    /// Returns `SafeCodeError::Catalog` if an embedded resource is malformed.
    pub fn bundled() -> Result<Self> {
        Ok(Self {
            vulnerabilities: VulnerabilityCatalog::bundled()?,
            performance: PerformanceCatalog::bundled()?,
        })
    }

    /// Loads both catalogs from caller-supplied JSON.
    pub fn from_json(vulnerabilities: &str, performance: &str) -> Result<Self> {
        Ok(Self {
            vulnerabilities: VulnerabilityCatalog::from_json(vulnerabilities)?,
            performance: PerformanceCatalog::from_json(performance)?,
        })
    }

    /// Checks that a rule's definition id resolves in both catalogs.
    ///
    /// # Errors
    ///
    /// Returns `SafeCodeError::DanglingDefinition` naming the first catalog
    /// that does not contain the id.
    pub fn ensure_resolves(&self, rule: &str, definition_id: &str) -> Result<()> {
        let missing = if !self.vulnerabilities.contains(definition_id) {
            Some("vulnerabilities")
        } else if !self.performance.contains(definition_id) {
            Some("performance-impacts")
        } else {
            None
        };

        match missing {
            Some(catalog) => Err(SafeCodeError::DanglingDefinition {
                rule: rule.to_string(),
                definition_id: definition_id.to_string(),
                catalog: catalog.to_string(),
            }),
            None => Ok(()),
        }
    }
}

pub(crate) fn catalog_error(catalog: &str, message: impl Into<String>) -> SafeCodeError {
    SafeCodeError::Catalog {
        catalog: catalog.to_string(),
        message: message.into(),
    }
}

/// Accepts ids written either as JSON strings or as integers.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s.trim().to_string(),
        RawId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalogs_cover_the_same_ids() {
        let catalogs = Catalogs::bundled().unwrap();
        for def in catalogs.vulnerabilities.iter() {
            assert!(
                catalogs.performance.contains(&def.id),
                "definition {} has no performance entry",
                def.id
            );
        }
        assert_eq!(
            catalogs.vulnerabilities.len(),
            catalogs.performance.len()
        );
    }

    #[test]
    fn test_ensure_resolves_reports_catalog() {
        let catalogs = Catalogs::from_json(
            r#"[{"id": "1", "type": "OTHER", "description": "d"}]"#,
            "[]",
        )
        .unwrap();

        let err = catalogs.ensure_resolves("demo", "1").unwrap_err();
        let SafeCodeError::DanglingDefinition { catalog, .. } = err else {
            panic!("expected a dangling definition");
        };
        assert_eq!(catalog, "performance-impacts");

        let err = catalogs.ensure_resolves("demo", "2").unwrap_err();
        assert!(matches!(
            err,
            SafeCodeError::DanglingDefinition { ref catalog, .. } if catalog == "vulnerabilities"
        ));
    }
}
