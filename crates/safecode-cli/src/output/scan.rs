// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};

use console::{StyledObject, style};
use safecode_core::{Finding, MatchBasis, SarifReport, Severity, UNKNOWN_LINE};

use super::Renderable;
use crate::cli::OutputContext;
use crate::commands::types::ScanResult;

fn styled_severity(severity: Severity) -> StyledObject<String> {
    let label = format!("{:<8}", severity.to_string().to_uppercase());
    match severity {
        Severity::Critical => style(label).red().bold(),
        Severity::High => style(label).red(),
        Severity::Medium => style(label).yellow(),
        Severity::Low => style(label).dim(),
    }
}

fn line_label(line: usize) -> String {
    if line == UNKNOWN_LINE {
        "?".to_string()
    } else {
        line.to_string()
    }
}

fn write_finding(w: &mut dyn Write, finding: &Finding, verbose: bool) -> io::Result<()> {
    let id = finding.definition_id.as_deref().unwrap_or("-");
    let mut tags = Vec::new();
    if let Some(regime) = &finding.compliance_regime {
        tags.push(regime.clone());
    }
    if finding.basis == MatchBasis::Textual {
        tags.push("heuristic".to_string());
    }
    let tags = if tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", tags.join(", "))
    };

    writeln!(
        w,
        "  {:>5}  {} {}  {}{}",
        style(line_label(finding.line)).dim(),
        styled_severity(finding.severity),
        style(format!("{id:<4}")).cyan(),
        finding.message,
        style(tags).dim()
    )?;

    if verbose {
        for recommendation in &finding.recommendations {
            writeln!(w, "{:>22}{}", "- ", style(recommendation).dim())?;
        }
        for impact in &finding.performance_impacts {
            writeln!(
                w,
                "{:>22}{} {}",
                "* ",
                style(format!("{:?}", impact.impact_level)).yellow(),
                style(&impact.description).dim()
            )?;
        }
    }
    Ok(())
}

impl Renderable for ScanResult {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        if self.report.is_empty() {
            writeln!(
                w,
                "{}",
                style(format!("No findings in {} file(s).", self.files_scanned)).green()
            )?;
            return Ok(());
        }

        for (path, findings) in self.report.iter() {
            writeln!(w)?;
            writeln!(w, "{}", style(path).bold())?;
            for finding in findings {
                write_finding(w, finding, ctx.verbose)?;
            }
        }

        if !ctx.quiet {
            let counts = self
                .severity_counts()
                .iter()
                .map(|(s, n)| format!("{s}: {n}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(w)?;
            writeln!(
                w,
                "{} in {} of {} file(s) ({counts})",
                style(format!("{} finding(s)", self.report.len())).bold(),
                self.report.file_count(),
                self.files_scanned
            )?;
            if !ctx.verbose {
                writeln!(
                    w,
                    "{}",
                    style("Use --verbose for recommendations and performance impacts.").dim()
                )?;
            }
        }
        Ok(())
    }

    fn sarif(&self) -> Option<&SarifReport> {
        Some(&self.sarif)
    }
}

#[cfg(test)]
mod tests {
    use safecode_core::{Category, ScanReport, VulnerabilityCatalog};

    use super::*;
    use crate::cli::OutputFormat;
    use crate::output::render_to;

    fn result() -> ScanResult {
        let report = ScanReport::from_findings(vec![Finding {
            message: "Potential SQL Injection detected".to_string(),
            file_path: "src/UserDao.java".to_string(),
            line: 12,
            category: Category::SqlInjection,
            severity: Severity::High,
            definition_id: Some("101".to_string()),
            rule_id: "injection".to_string(),
            recommendations: vec!["Use PreparedStatement".to_string()],
            ..Finding::default()
        }]);
        let sarif = SarifReport::from_report(&report, &VulnerabilityCatalog::bundled().unwrap());
        ScanResult {
            report,
            files_scanned: 2,
            enrichment_requested: false,
            sarif,
        }
    }

    fn ctx(format: OutputFormat, verbose: bool) -> OutputContext {
        OutputContext {
            format,
            quiet: false,
            verbose,
            is_tty: false,
        }
    }

    fn rendered(format: OutputFormat, verbose: bool) -> String {
        let mut out = Vec::new();
        render_to(&result(), &ctx(format, verbose), &mut out).unwrap();
        console::strip_ansi_codes(&String::from_utf8(out).unwrap()).into_owned()
    }

    #[test]
    fn test_text_lists_findings_per_file() {
        let text = rendered(OutputFormat::Text, false);
        assert!(text.contains("src/UserDao.java"));
        assert!(text.contains("HIGH"));
        assert!(text.contains("101"));
        assert!(text.contains("1 finding(s) in 1 of 2 file(s) (high: 1)"));
        assert!(!text.contains("Use PreparedStatement"));
    }

    #[test]
    fn test_verbose_text_shows_recommendations() {
        assert!(rendered(OutputFormat::Text, true).contains("Use PreparedStatement"));
    }

    #[test]
    fn test_json_is_the_report_map() {
        let json: serde_json::Value =
            serde_json::from_str(&rendered(OutputFormat::Json, false)).unwrap();
        assert_eq!(json["src/UserDao.java"][0]["definitionId"], "101");
    }

    #[test]
    fn test_sarif_output() {
        let json: serde_json::Value =
            serde_json::from_str(&rendered(OutputFormat::Sarif, false)).unwrap();
        assert_eq!(json["version"], "2.1.0");
        assert_eq!(json["runs"][0]["results"][0]["ruleId"], "101");
    }
}
