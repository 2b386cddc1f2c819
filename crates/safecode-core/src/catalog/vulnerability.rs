// SPDX-License-Identifier: Apache-2.0

//! Vulnerability definitions keyed by stable id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{catalog_error, deserialize_id};
use crate::finding::{Category, Severity};
use crate::Result;

/// Embedded vulnerability catalog JSON.
pub(crate) const VULNERABILITIES_JSON: &str = include_str!("vulnerabilities.json");

/// A known issue class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityDefinition {
    /// Stable, unique id (e.g., `"101"`).
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Issue category.
    #[serde(rename = "type")]
    pub category: Category,
    /// Human-readable description.
    pub description: String,
    /// Default severity for findings of this definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Remediation guidance attached to every finding.
    #[serde(rename = "recommendations", default)]
    pub base_recommendations: Vec<String>,
}

/// Immutable registry of vulnerability definitions.
///
/// Preserves the resource order for listing and indexes by id for lookup.
#[derive(Debug, Clone, Default)]
pub struct VulnerabilityCatalog {
    definitions: Vec<VulnerabilityDefinition>,
    index: HashMap<String, usize>,
}

impl VulnerabilityCatalog {
    /// Creates the catalog from the embedded resource.
    pub fn bundled() -> Result<Self> {
        Self::from_json(VULNERABILITIES_JSON)
    }

    /// Parses a catalog resource.
    ///
    /// # Errors
    ///
    /// Returns `SafeCodeError::Catalog` on malformed JSON or duplicate ids.
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<VulnerabilityDefinition> = serde_json::from_str(json)
            .map_err(|e| catalog_error("vulnerabilities", e.to_string()))?;

        let mut index = HashMap::with_capacity(definitions.len());
        for (pos, def) in definitions.iter().enumerate() {
            if index.insert(def.id.clone(), pos).is_some() {
                return Err(catalog_error(
                    "vulnerabilities",
                    format!("duplicate definition id '{}'", def.id),
                ));
            }
        }

        Ok(Self { definitions, index })
    }

    /// Looks up a definition by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&VulnerabilityDefinition> {
        self.index.get(id).map(|&pos| &self.definitions[pos])
    }

    /// Whether the id resolves.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Iterates definitions in resource order.
    pub fn iter(&self) -> impl Iterator<Item = &VulnerabilityDefinition> {
        self.definitions.iter()
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = VulnerabilityCatalog::bundled().unwrap();
        assert_eq!(catalog.len(), 27);

        let def = catalog.get("101").unwrap();
        assert_eq!(def.category, Category::SqlInjection);
        assert_eq!(def.severity, Some(Severity::High));
        assert!(!def.base_recommendations.is_empty());

        let hipaa = catalog.get("1001").unwrap();
        assert_eq!(hipaa.category, Category::ComplianceViolation);
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let json = r#"[{"id": 42, "type": "SQL_INJECTION", "description": "d", "recommendations": []}]"#;
        let catalog = VulnerabilityCatalog::from_json(json).unwrap();
        assert!(catalog.contains("42"));
        assert_eq!(catalog.get("42").unwrap().severity, None);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": "1", "type": "SQL_INJECTION", "description": "a"},
            {"id": "1", "type": "SQL_INJECTION", "description": "b"}
        ]"#;
        let err = VulnerabilityCatalog::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate definition id '1'"));
    }

    #[test]
    fn test_malformed_catalog_is_catalog_error() {
        let err = VulnerabilityCatalog::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::SafeCodeError::Catalog { .. }));
    }

    #[test]
    fn test_iteration_preserves_resource_order() {
        let catalog = VulnerabilityCatalog::bundled().unwrap();
        let ids: Vec<&str> = catalog.iter().map(|d| d.id.as_str()).take(3).collect();
        assert_eq!(ids, vec!["101", "102", "103"]);
    }
}
