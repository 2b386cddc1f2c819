// SPDX-License-Identifier: Apache-2.0

//! Scan command: load inputs, run one session, optionally enrich.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use safecode_core::{
    AppConfig, Catalogs, HttpRecommendationService, Language, PROJECT_CONFIG_FILE,
    ProjectConfig, RuleRegistry, SarifReport, Scanner, SyntaxTree,
};
use tracing::{debug, info};

use super::maybe_spinner;
use super::types::ScanResult;
use crate::cli::OutputContext;

/// Reads one input file.
///
/// `.json` files are syntax trees; configuration files are kept as text.
pub fn load_tree(path: &Path) -> Result<SyntaxTree> {
    let display = path.display().to_string();
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {display}"))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        return SyntaxTree::from_json(&contents)
            .with_context(|| format!("Failed to parse syntax tree {display}"));
    }
    if Language::from_path(&display).is_key_value() {
        return Ok(SyntaxTree::from_text(display, contents));
    }
    bail!("Unsupported input {display}: expected a .json tree or a .properties/.yml/.yaml file")
}

/// Loads the project configuration from `path`, or from the working
/// directory when present.
fn load_project(path: Option<&Path>) -> Result<ProjectConfig> {
    match path {
        Some(p) => ProjectConfig::load(p)
            .with_context(|| format!("Failed to load project configuration {}", p.display())),
        None => Ok(ProjectConfig::load_or_default(Path::new(PROJECT_CONFIG_FILE))),
    }
}

/// Runs a scan session over `files`.
pub async fn run(
    files: &[PathBuf],
    project: Option<&Path>,
    config: &AppConfig,
    ctx: &OutputContext,
) -> Result<ScanResult> {
    let trees = files
        .iter()
        .map(|f| load_tree(f))
        .collect::<Result<Vec<_>>>()?;
    let project = load_project(project)?;
    debug!(
        files = trees.len(),
        regimes = project.compliance_regimes.len(),
        "Inputs loaded"
    );

    let catalogs = Catalogs::bundled().context("Failed to load bundled catalogs")?;
    let registry = RuleRegistry::standard(&catalogs, &config.scan)?;
    let scanner = Scanner::new(
        &catalogs,
        &registry,
        &project,
        &config.scan,
        &config.severity,
    );

    let service = HttpRecommendationService::from_config(&config.enrichment)?;
    let report = match &service {
        Some(service) => {
            info!(url = service.url(), "Requesting recommendations");
            let spinner = maybe_spinner(ctx, "Fetching recommendations...");
            let report = scanner.scan_and_enrich(&trees, service).await;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }
            report?
        }
        None => scanner.scan(&trees)?,
    };

    let sarif = SarifReport::from_report(&report, &catalogs.vulnerabilities);
    Ok(ScanResult {
        report,
        files_scanned: trees.len(),
        enrichment_requested: service.is_some(),
        sarif,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_properties_as_text() {
        let mut file = tempfile::Builder::new().suffix(".properties").tempfile().unwrap();
        writeln!(file, "db.password=hunter2").unwrap();

        let tree = load_tree(file.path()).unwrap();
        assert_eq!(tree.language(), Language::Properties);
        assert!(tree.source().contains("hunter2"));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".java").tempfile().unwrap();
        let err = load_tree(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported input"));
    }

    #[test]
    fn test_malformed_tree_keeps_context() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{\"path\": 42}}").unwrap();

        let err = load_tree(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse syntax tree"));
        assert!(err.downcast_ref::<safecode_core::SafeCodeError>().is_some());
    }
}
