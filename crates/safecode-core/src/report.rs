// SPDX-License-Identifier: Apache-2.0

//! Per-file aggregation of findings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::finding::{Finding, Severity};

/// Findings grouped by file path.
///
/// Paths are ordered, files without findings are absent, and each file keeps
/// its findings in detection order. An empty report means nothing was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanReport {
    files: BTreeMap<String, Vec<Finding>>,
}

impl ScanReport {
    /// Groups findings by their `file_path`, keeping relative order.
    #[must_use]
    pub fn from_findings(findings: impl IntoIterator<Item = Finding>) -> Self {
        let mut files: BTreeMap<String, Vec<Finding>> = BTreeMap::new();
        for finding in findings {
            files
                .entry(finding.file_path.clone())
                .or_default()
                .push(finding);
        }
        Self { files }
    }

    /// Whether no file has findings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Number of files with findings.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Findings of one file.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[Finding]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// `(path, findings)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Finding])> {
        self.files
            .iter()
            .map(|(path, findings)| (path.as_str(), findings.as_slice()))
    }

    /// Every finding, file by file.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.files.values().flatten()
    }

    /// Number of findings at a severity.
    #[must_use]
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.findings().filter(|f| f.severity == severity).count()
    }

    /// Underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Vec<Finding>> {
        self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(path: &str, line: usize) -> Finding {
        Finding {
            file_path: path.to_string(),
            line,
            ..Finding::default()
        }
    }

    #[test]
    fn test_groups_by_path_in_order() {
        let report = ScanReport::from_findings(vec![
            finding("src/B.java", 9),
            finding("src/A.java", 3),
            finding("src/B.java", 2),
        ]);

        assert_eq!(report.file_count(), 2);
        assert_eq!(report.len(), 3);

        let paths: Vec<&str> = report.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["src/A.java", "src/B.java"]);

        let lines: Vec<usize> = report.get("src/B.java").unwrap().iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![9, 2]);
    }

    #[test]
    fn test_empty_report() {
        let report = ScanReport::from_findings(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
        assert_eq!(serde_json::to_string(&report).unwrap(), "{}");
    }

    #[test]
    fn test_count_severity() {
        let mut high = finding("A.java", 1);
        high.severity = Severity::High;
        let report = ScanReport::from_findings(vec![high, finding("A.java", 2)]);
        assert_eq!(report.count_severity(Severity::High), 1);
        assert_eq!(report.count_severity(Severity::Medium), 1);
        assert_eq!(report.count_severity(Severity::Critical), 0);
    }
}
