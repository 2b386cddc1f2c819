// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the SafeCode CLI.
//!
//! Uses `tracing` with `tracing-subscriber`, writing to stderr so that
//! structured output on stdout stays parseable.
//!
//! # Examples
//!
//! ```bash
//! # Default: warnings only
//! safecode scan UserDao.json
//!
//! # Per-rule matches and exemptions
//! RUST_LOG=safecode_core=debug safecode scan UserDao.json
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "safecode=debug,safecode_core=debug,reqwest=warn"
    } else {
        "warn"
    }
}

/// Initialize the logging subsystem.
///
/// `RUST_LOG` wins; otherwise `verbose` selects debug output for SafeCode
/// crates.
pub fn init_logging(verbose: bool) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
