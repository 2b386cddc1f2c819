// SPDX-License-Identifier: Apache-2.0

//! Performance cost of remediating each definition.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{catalog_error, deserialize_id};
use crate::Result;

/// Embedded performance-impact catalog JSON.
pub(crate) const PERFORMANCE_IMPACTS_JSON: &str = include_str!("performance-impacts.json");

/// Relative cost of a remediation option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactLevel {
    /// No measurable cost.
    Negligible,
    /// Small cost.
    Low,
    /// Noticeable cost.
    Medium,
    /// Significant cost.
    High,
}

/// One remediation option and its estimated cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceImpactEntry {
    /// Option id, unique within its definition.
    pub id: u32,
    /// Relative cost.
    pub impact_level: ImpactLevel,
    /// Short description.
    pub description: String,
    /// Longer explanation.
    #[serde(rename = "details")]
    pub detail: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerformanceRecord {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(rename = "performanceImpactOptions", default)]
    options: Vec<PerformanceImpactEntry>,
}

/// Immutable registry of definition id to ordered impact entries.
#[derive(Debug, Clone, Default)]
pub struct PerformanceCatalog {
    entries: HashMap<String, Vec<PerformanceImpactEntry>>,
}

impl PerformanceCatalog {
    /// Creates the catalog from the embedded resource.
    pub fn bundled() -> Result<Self> {
        Self::from_json(PERFORMANCE_IMPACTS_JSON)
    }

    /// Parses a performance-impact resource.
    ///
    /// The `type` and `recommendations` fields of each record are accepted
    /// but not retained; the vulnerability catalog owns them.
    ///
    /// # Errors
    ///
    /// Returns `SafeCodeError::Catalog` on malformed JSON or duplicate ids.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<PerformanceRecord> = serde_json::from_str(json)
            .map_err(|e| catalog_error("performance-impacts", e.to_string()))?;

        let mut entries = HashMap::with_capacity(records.len());
        for record in records {
            if entries.contains_key(&record.id) {
                return Err(catalog_error(
                    "performance-impacts",
                    format!("duplicate definition id '{}'", record.id),
                ));
            }
            entries.insert(record.id, record.options);
        }

        Ok(Self { entries })
    }

    /// Impact entries for a definition, in resource order.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&[PerformanceImpactEntry]> {
        self.entries.get(id).map(Vec::as_slice)
    }

    /// Whether the id resolves.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of definitions with impact data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
