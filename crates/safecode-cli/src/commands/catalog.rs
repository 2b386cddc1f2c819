// SPDX-License-Identifier: Apache-2.0

//! Catalog and rule inspection commands.

use anyhow::{Context, Result, anyhow};
use safecode_core::{AppConfig, Catalogs, RuleRegistry, ScanConfig};

use super::types::{CatalogListResult, CatalogShowResult, RuleInfo, RulesResult};

fn catalogs() -> Result<Catalogs> {
    Catalogs::bundled().context("Failed to load bundled catalogs")
}

/// Every vulnerability definition, in catalog order.
pub fn list() -> Result<CatalogListResult> {
    let catalogs = catalogs()?;
    Ok(CatalogListResult {
        definitions: catalogs.vulnerabilities.iter().cloned().collect(),
    })
}

/// One definition with its performance impacts and emitting rule.
pub fn show(id: &str) -> Result<CatalogShowResult> {
    let catalogs = catalogs()?;
    let definition = catalogs
        .vulnerabilities
        .get(id)
        .cloned()
        .ok_or_else(|| anyhow!("Unknown definition id: {id}. Run `safecode catalog list`."))?;

    let registry = RuleRegistry::standard(&catalogs, &ScanConfig::default())?;
    let rule = registry
        .iter()
        .find(|r| r.definition_ids().iter().any(|d| *d == id))
        .map(|r| r.id().to_string());

    Ok(CatalogShowResult {
        performance_impacts: catalogs
            .performance
            .get(id)
            .map(<[_]>::to_vec)
            .unwrap_or_default(),
        definition,
        rule,
    })
}

/// Every built-in rule, marking those disabled by configuration.
pub fn rules(config: &AppConfig) -> Result<RulesResult> {
    let catalogs = catalogs()?;
    let registry = RuleRegistry::standard(&catalogs, &ScanConfig::default())?;

    let rules = registry
        .iter()
        .map(|rule| RuleInfo {
            id: rule.id().to_string(),
            name: rule.name().to_string(),
            definition_ids: rule
                .definition_ids()
                .iter()
                .map(ToString::to_string)
                .collect(),
            compliance_regime: rule.compliance_regime().map(ToString::to_string),
            enabled: config.scan.is_rule_enabled(rule.id()),
        })
        .collect();
    Ok(RulesResult { rules })
}
