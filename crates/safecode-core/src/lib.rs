// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # SafeCode Core
//!
//! Static security and compliance detection for Java syntax trees.
//!
//! This crate provides:
//! - Vulnerability and performance-impact catalogs, validated at startup
//! - Detector rules for OWASP-style issues and the HIPAA overlay
//! - Permit-all exemption extraction from security configuration
//! - Parallel scan orchestration with per-rule failure isolation
//! - Enrichment from the catalogs and an optional recommendation service
//! - Per-file aggregation and SARIF export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use safecode_core::{
//!     AppConfig, Catalogs, ProjectConfig, RuleRegistry, Scanner, SyntaxTree,
//! };
//!
//! # fn example(json: &str) -> safecode_core::Result<()> {
//! let config = AppConfig::default();
//! let catalogs = Catalogs::bundled()?;
//! let registry = RuleRegistry::standard(&catalogs, &config.scan)?;
//! let project = ProjectConfig::default();
//!
//! let tree = SyntaxTree::from_json(json)?;
//! let scanner = Scanner::new(&catalogs, &registry, &project, &config.scan, &config.severity);
//! let report = scanner.scan(&[tree])?;
//!
//! for (path, findings) in report.iter() {
//!     println!("{path}: {} findings", findings.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Vulnerability and performance-impact catalogs
//! - [`rules`] - Detector rules
//! - [`engine`] - Scan orchestration
//! - [`enrichment`] - Performance impacts and remote recommendations
//! - [`syntax`] - Syntax tree model and visitor

// ============================================================================
// Error Handling
// ============================================================================

pub use error::SafeCodeError;

/// Convenience Result type for SafeCode operations.
///
/// This is equivalent to `std::result::Result<T, SafeCodeError>`.
pub type Result<T> = std::result::Result<T, SafeCodeError>;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    AppConfig, DEFAULT_RECOMMENDATION_URL, EnrichmentConfig, ScanConfig, SeverityConfig,
    config_dir, config_file_path, load_config,
};
pub use project::{PROJECT_CONFIG_FILE, ProjectConfig};

// ============================================================================
// Catalogs
// ============================================================================

pub use catalog::{
    Catalogs, ImpactLevel, PerformanceCatalog, PerformanceImpactEntry, VulnerabilityCatalog,
    VulnerabilityDefinition,
};

// ============================================================================
// Syntax Trees
// ============================================================================

pub use syntax::{Language, NodeId, NodeKind, SyntaxTree, TreeBuilder};

// ============================================================================
// Detection
// ============================================================================

pub use exemption::{ExemptionExtractor, ExemptionSet};
pub use finding::{Category, Confidence, Finding, MatchBasis, Severity, UNKNOWN_LINE};
pub use registry::RuleRegistry;
pub use rules::DetectorRule;
pub use session::ScanSession;

// ============================================================================
// Orchestration and Output
// ============================================================================

pub use engine::Scanner;
pub use enrichment::{HttpRecommendationService, RecommendationService};
pub use report::ScanReport;
pub use sarif::SarifReport;

// ============================================================================
// Modules
// ============================================================================

pub mod catalog;
pub mod compliance;
pub mod config;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod exemption;
pub mod finding;
pub mod project;
pub mod registry;
pub mod report;
pub mod rules;
pub mod sarif;
pub mod session;
pub mod syntax;
