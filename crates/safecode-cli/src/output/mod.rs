// SPDX-License-Identifier: Apache-2.0

//! Output rendering for CLI commands.
//!
//! Supports text, JSON, YAML and SARIF. Command handlers return data; this
//! module handles presentation.

use std::io::{self, Write};

use anyhow::{Context, Result};
use safecode_core::SarifReport;
use serde::Serialize;

use crate::cli::{OutputContext, OutputFormat};

mod catalog;
mod scan;

/// Trait for types that can be rendered in multiple output formats.
pub trait Renderable: Serialize {
    /// Render as human-readable text to the given writer.
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()>;

    /// SARIF rendition. Types without one fall back to JSON.
    fn sarif(&self) -> Option<&SarifReport> {
        None
    }
}

/// Generic render function: JSON/YAML/SARIF via serde, text via the trait.
pub fn render<T: Renderable>(result: &T, ctx: &OutputContext) -> Result<()> {
    let mut stdout = io::stdout().lock();
    render_to(result, ctx, &mut stdout)
}

/// Renders `result` to `w`.
pub fn render_to<T: Renderable>(result: &T, ctx: &OutputContext, w: &mut dyn Write) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(result).context("Failed to serialize to JSON")?;
            writeln!(w, "{json}")?;
        }
        OutputFormat::Sarif => {
            let json = match result.sarif() {
                Some(sarif) => serde_json::to_string_pretty(sarif),
                None => serde_json::to_string_pretty(result),
            }
            .context("Failed to serialize to SARIF")?;
            writeln!(w, "{json}")?;
        }
        OutputFormat::Yaml => {
            let yaml = serde_saphyr::to_string(result).context("Failed to serialize to YAML")?;
            writeln!(w, "{yaml}")?;
        }
        OutputFormat::Text => {
            result
                .render_text(w, ctx)
                .context("Failed to render text")?;
        }
    }
    Ok(())
}
