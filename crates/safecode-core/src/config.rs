// SPDX-License-Identifier: Apache-2.0

//! Configuration management for SafeCode.
//!
//! Provides layered configuration from files and environment variables.
//! Uses XDG-compliant paths with environment variable support.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (prefix: `SAFECODE_`)
//! 2. Config file: `~/.config/safecode/config.toml`
//! 3. Built-in defaults
//!
//! # Examples
//!
//! ```bash
//! # Point enrichment at a local recommendation service
//! SAFECODE_ENRICHMENT__RECOMMENDATION_URL=http://localhost:8080/api/v1/code-analysis/check safecode scan tree.json
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::SafeCodeError;
use crate::finding::{Category, Finding, Severity};

/// Default endpoint of the recommendation service.
pub const DEFAULT_RECOMMENDATION_URL: &str = "http://localhost:8080/api/v1/code-analysis/check";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scan behaviour.
    pub scan: ScanConfig,
    /// Enrichment settings.
    pub enrichment: EnrichmentConfig,
    /// Severity mapping.
    pub severity: SeverityConfig,
}

/// Scan behaviour and ignore rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Scan files on the rayon pool (default: true).
    pub parallel: bool,
    /// Rule ids to leave out of the registry (e.g., `["insufficient-logging"]`).
    pub disabled_rules: Vec<String>,
    /// Definition ids whose findings are dropped (e.g., `["102"]`).
    pub ignore_definitions: Vec<String>,
    /// File path prefixes whose findings are dropped (e.g., `["src/test/"]`).
    pub ignore_paths: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            disabled_rules: Vec::new(),
            ignore_definitions: Vec::new(),
            ignore_paths: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Check if a finding should be ignored based on configuration.
    ///
    /// A finding is ignored if:
    /// - Its definition id matches any entry in `ignore_definitions`
    /// - Its file path starts with any entry in `ignore_paths`
    #[must_use]
    pub fn should_ignore(&self, finding: &Finding) -> bool {
        if let Some(id) = &finding.definition_id
            && self.ignore_definitions.contains(id)
        {
            return true;
        }

        self.ignore_paths
            .iter()
            .any(|prefix| finding.file_path.starts_with(prefix))
    }

    /// Whether the rule with the given id is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        !self.disabled_rules.iter().any(|r| r == rule_id)
    }
}

/// Recommendation enrichment settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Recommendation service endpoint. `None` disables the remote call.
    pub recommendation_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            recommendation_url: None,
            timeout_seconds: 10,
        }
    }
}

/// Explicit severity mapping.
///
/// Keys are matched case-insensitively. Category keys use snake case
/// (`sql_injection`), definition keys are catalog ids (`"101"`), and regime
/// keys are regime names (`hipaa`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    /// Per-definition severity.
    pub definitions: HashMap<String, Severity>,
    /// Per-category severity.
    pub categories: HashMap<String, Severity>,
    /// Minimum severity for compliance findings of a regime.
    pub regimes: HashMap<String, Severity>,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            definitions: HashMap::new(),
            categories: HashMap::new(),
            regimes: HashMap::from([("hipaa".to_string(), Severity::Critical)]),
        }
    }
}

impl SeverityConfig {
    /// Severity configured for a definition id.
    #[must_use]
    pub fn for_definition(&self, id: &str) -> Option<Severity> {
        lookup(&self.definitions, id)
    }

    /// Severity configured for a category.
    #[must_use]
    pub fn for_category(&self, category: Category) -> Option<Severity> {
        lookup(&self.categories, category.key())
    }

    /// Minimum severity for findings of a compliance regime.
    #[must_use]
    pub fn regime_floor(&self, regime: &str) -> Option<Severity> {
        lookup(&self.regimes, regime)
    }
}

fn lookup(map: &HashMap<String, Severity>, key: &str) -> Option<Severity> {
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| *v)
}

/// Returns the SafeCode configuration directory.
///
/// Respects the `XDG_CONFIG_HOME` environment variable if set,
/// otherwise defaults to `~/.config/safecode`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join("safecode");
    }
    dirs::home_dir()
        .unwrap_or_default()
        .join(".config")
        .join("safecode")
}

/// Returns the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load application configuration.
///
/// Loads from config file (if exists) and environment variables.
/// Environment variables use the prefix `SAFECODE_` and double underscore
/// for nested keys (e.g., `SAFECODE_SCAN__PARALLEL`).
///
/// # Errors
///
/// Returns `SafeCodeError::Config` if the config file exists but is invalid.
pub fn load_config() -> Result<AppConfig, SafeCodeError> {
    let config_path = config_file_path();

    let config = Config::builder()
        // Load from config file (optional - may not exist)
        .add_source(File::with_name(config_path.to_string_lossy().as_ref()).required(false))
        // Override with environment variables
        .add_source(
            Environment::with_prefix("SAFECODE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    Ok(app_config)
}
