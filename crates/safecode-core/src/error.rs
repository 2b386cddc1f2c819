// SPDX-License-Identifier: Apache-2.0

//! Error types for the SafeCode engine.
//!
//! Uses `thiserror` for deriving `std::error::Error` implementations.
//! Application code should use `anyhow::Result` for top-level error handling.

use thiserror::Error;

/// Errors that can occur during SafeCode operations.
#[derive(Error, Debug)]
pub enum SafeCodeError {
    /// A bundled or user-supplied catalog could not be loaded.
    #[error("Catalog error in {catalog}: {message}")]
    Catalog {
        /// Catalog name (`vulnerabilities` or `performance-impacts`).
        catalog: String,
        /// Error message.
        message: String,
    },

    /// A detector references a definition id that a catalog does not contain.
    #[error("Rule '{rule}' references unknown definition '{definition_id}' in the {catalog} catalog")]
    DanglingDefinition {
        /// Rule identifier.
        rule: String,
        /// The unresolved definition id.
        definition_id: String,
        /// Catalog that failed to resolve it.
        catalog: String,
    },

    /// A syntax tree is structurally invalid.
    #[error("Invalid syntax tree for {path}: {message}")]
    Tree {
        /// File path the tree belongs to.
        path: String,
        /// Error message.
        message: String,
    },

    /// Configuration file error.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// A detector rule failed while scanning a file.
    #[error("Rule '{rule}' failed: {message}")]
    Rule {
        /// Rule identifier.
        rule: String,
        /// Error message.
        message: String,
    },

    /// Invalid JSON (tree, config, or service response).
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Network/HTTP error from reqwest.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SafeCodeError {
    /// Builds a rule failure for the given rule id.
    pub fn rule(rule: &str, message: impl Into<String>) -> Self {
        SafeCodeError::Rule {
            rule: rule.to_string(),
            message: message.into(),
        }
    }

    /// Builds a tree error for the given path.
    pub fn tree(path: &str, message: impl Into<String>) -> Self {
        SafeCodeError::Tree {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for SafeCodeError {
    fn from(err: config::ConfigError) -> Self {
        SafeCodeError::Config {
            message: err.to_string(),
        }
    }
}
