// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use console::style;

use super::Renderable;
use crate::cli::OutputContext;
use crate::commands::types::{CatalogListResult, CatalogShowResult, RulesResult};

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

impl Renderable for CatalogListResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        let mut table = table(&["ID", "Category", "Severity", "Description"]);
        for definition in &self.definitions {
            table.add_row(vec![
                definition.id.clone(),
                definition.category.to_string(),
                definition
                    .severity
                    .map_or_else(|| "-".to_string(), |s| s.to_string()),
                definition.description.clone(),
            ]);
        }
        writeln!(w, "{table}")
    }
}

impl Renderable for CatalogShowResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        let d = &self.definition;
        writeln!(w)?;
        writeln!(
            w,
            "{} {}",
            style(&d.id).cyan().bold(),
            style(&d.description).bold()
        )?;
        writeln!(w, "  {}  {}", style("category:").dim(), d.category)?;
        if let Some(severity) = d.severity {
            writeln!(w, "  {}  {severity}", style("severity:").dim())?;
        }
        if let Some(rule) = &self.rule {
            writeln!(w, "  {}      {rule}", style("rule:").dim())?;
        }

        if !d.base_recommendations.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", style("Recommendations:").bold())?;
            for recommendation in &d.base_recommendations {
                writeln!(w, "  - {recommendation}")?;
            }
        }

        if !self.performance_impacts.is_empty() {
            writeln!(w)?;
            let mut table = table(&["#", "Impact", "Option", "Details"]);
            for impact in &self.performance_impacts {
                table.add_row(vec![
                    impact.id.to_string(),
                    format!("{:?}", impact.impact_level),
                    impact.description.clone(),
                    impact.detail.clone(),
                ]);
            }
            writeln!(w, "{table}")?;
        }
        Ok(())
    }
}

impl Renderable for RulesResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        let mut table = table(&["Rule", "Name", "Definitions", "Regime", "Enabled"]);
        for rule in &self.rules {
            table.add_row(vec![
                rule.id.clone(),
                rule.name.clone(),
                rule.definition_ids.join(", "),
                rule.compliance_regime.clone().unwrap_or_default(),
                if rule.enabled { "yes" } else { "no" }.to_string(),
            ]);
        }
        writeln!(w, "{table}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::commands::catalog;
    use crate::output::render_to;

    fn text<T: Renderable>(result: &T) -> String {
        let ctx = OutputContext {
            format: OutputFormat::Text,
            quiet: false,
            verbose: false,
            is_tty: false,
        };
        let mut out = Vec::new();
        render_to(result, &ctx, &mut out).unwrap();
        console::strip_ansi_codes(&String::from_utf8(out).unwrap()).into_owned()
    }

    #[test]
    fn test_catalog_list_table() {
        let output = text(&catalog::list().unwrap());
        assert!(output.contains("Description"));
        assert!(output.contains("101"));
        assert!(output.contains("1001"));
    }

    #[test]
    fn test_catalog_show_details() {
        let output = text(&catalog::show("603").unwrap());
        assert!(output.contains("603"));
        assert!(output.contains("security_misconfiguration"));
        assert!(output.contains("misconfiguration"));
    }
}
