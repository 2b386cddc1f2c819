// SPDX-License-Identifier: Apache-2.0

//! Caller-supplied project configuration (`safecode-config.json`).

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// File name integrations look for at the project root.
pub const PROJECT_CONFIG_FILE: &str = "safecode-config.json";

/// Project type used when none is declared.
pub const DEFAULT_PROJECT_TYPE: &str = "general";

fn default_project_type() -> String {
    DEFAULT_PROJECT_TYPE.to_string()
}

/// Read-only description of the scanned project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Project type (e.g., `"healthcare"`).
    #[serde(default = "default_project_type")]
    pub project_type: String,
    /// Declared compliance regimes (e.g., `["HIPAA"]`).
    #[serde(rename = "compliance", default)]
    pub compliance_regimes: BTreeSet<String>,
    /// Free-form settings.
    #[serde(default)]
    pub custom_settings: BTreeMap<String, Value>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_type: default_project_type(),
            compliance_regimes: BTreeSet::new(),
            custom_settings: BTreeMap::new(),
        }
    }
}

impl ProjectConfig {
    /// Parses a project configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a project configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Reads a project configuration file, falling back to defaults.
    ///
    /// A missing file is normal; an unreadable or malformed one is logged.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to load project config: {e}");
                Self::default()
            }
        }
    }

    /// Whether a regime is declared (case-insensitive).
    #[must_use]
    pub fn declares(&self, regime: &str) -> bool {
        self.compliance_regimes
            .iter()
            .any(|r| r.trim().eq_ignore_ascii_case(regime))
    }

    /// String value of a custom setting.
    #[must_use]
    pub fn custom_str(&self, key: &str) -> Option<&str> {
        self.custom_settings.get(key).and_then(Value::as_str)
    }
}
