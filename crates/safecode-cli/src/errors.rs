// SPDX-License-Identifier: Apache-2.0

//! CLI-specific error formatting with user-friendly hints.
//!
//! Downcasts `anyhow::Error` to `SafeCodeError` and appends a hint per
//! variant. The library keeps structured errors; presentation lives here.

use anyhow::Error;
use safecode_core::SafeCodeError;

const READ_HINT: &str = "Check that the file exists and is readable.";

/// Formats an error for CLI display with helpful hints.
///
/// The full context chain is kept. Plain I/O errors get the read hint;
/// any other error is returned without one.
pub fn format_error(error: &Error) -> String {
    let message = format!("{error:#}");
    let tip = match error.downcast_ref::<SafeCodeError>() {
        Some(e) => hint(e),
        None => error
            .downcast_ref::<std::io::Error>()
            .map(|_| READ_HINT.to_string()),
    };
    match tip {
        Some(tip) => format!("{message}\n\nTip: {tip}"),
        None => message,
    }
}

fn hint(error: &SafeCodeError) -> Option<String> {
    let tip = match error {
        SafeCodeError::Catalog { .. } | SafeCodeError::DanglingDefinition { .. } => {
            "The bundled catalogs are inconsistent with the rules. Please report this as a bug."
                .to_string()
        }
        SafeCodeError::Tree { .. } | SafeCodeError::InvalidJson(_) => {
            "Syntax trees must use the JSON interchange format: {path, nodes: [...]} with a `file` root at index 0."
                .to_string()
        }
        SafeCodeError::Config { .. } => format!(
            "Check your config file at {}",
            safecode_core::config_file_path().display()
        ),
        SafeCodeError::Network(_) => {
            "Check the recommendation service URL and your network connection.".to_string()
        }
        SafeCodeError::Io(_) => READ_HINT.to_string(),
        SafeCodeError::Rule { .. } => return None,
    };
    Some(tip)
}
