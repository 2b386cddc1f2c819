// SPDX-License-Identifier: Apache-2.0

//! Compliance overlay.
//!
//! Regime-specific rules only run for projects that declare the regime, and
//! their findings are tagged with it and raised to the regime's configured
//! minimum severity.

use tracing::debug;

use crate::config::SeverityConfig;
use crate::finding::Finding;
use crate::project::ProjectConfig;
use crate::rules::DetectorRule;

/// Whether a rule should run for this project.
///
/// Rules without a regime always apply.
#[must_use]
pub fn applies(rule: &dyn DetectorRule, project: &ProjectConfig) -> bool {
    match rule.compliance_regime() {
        Some(regime) => {
            let declared = project.declares(regime);
            if !declared {
                debug!(rule = rule.id(), regime, "Regime not declared, skipping rule");
            }
            declared
        }
        None => true,
    }
}

/// Tags findings of a regime rule and applies the regime severity floor.
pub fn apply(regime: &str, severity: &SeverityConfig, findings: &mut [Finding]) {
    let floor = severity.regime_floor(regime);
    for finding in findings {
        finding.is_compliance = true;
        finding.compliance_regime = Some(regime.to_string());
        if let Some(floor) = floor {
            finding.severity = finding.severity.at_least(floor);
        }
    }
}
