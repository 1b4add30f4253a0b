use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Finding, Severity};

/// Policy verdict: the final pass/fail decision after applying the ignore
/// list and severity overrides to raw findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub pass: bool,
    pub total_findings: usize,
    pub effective_findings: usize,
    pub non_compliant_findings: usize,
    pub highest_severity: Option<Severity>,
    pub fail_threshold: Severity,
}

/// Policy configuration loaded from `.fipsscan.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Minimum severity of a non-compliant finding that fails the scan.
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,
    /// Rule categories to drop from the report.
    #[serde(default)]
    pub ignore_categories: HashSet<String>,
    /// Per-category severity overrides.
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
    /// Count unresolved algorithms/providers as non-compliant.
    #[serde(default)]
    pub fail_on_unresolved: bool,
}

fn default_fail_on() -> Severity {
    Severity::High
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            fail_on: Severity::High,
            ignore_categories: HashSet::new(),
            overrides: HashMap::new(),
            fail_on_unresolved: false,
        }
    }
}

impl Policy {
    fn effective_severity(&self, finding: &Finding) -> Severity {
        self.overrides
            .get(&finding.category)
            .copied()
            .unwrap_or(finding.severity)
    }

    fn is_violation(&self, finding: &Finding) -> bool {
        finding.is_non_compliant() || (self.fail_on_unresolved && finding.has_unresolved())
    }

    /// Evaluate findings against this policy and produce a verdict.
    pub fn evaluate(&self, findings: &[Finding]) -> PolicyVerdict {
        let effective: Vec<&Finding> = findings
            .iter()
            .filter(|f| !self.ignore_categories.contains(&f.category))
            .collect();

        let violations: Vec<Severity> = effective
            .iter()
            .filter(|f| self.is_violation(f))
            .map(|f| self.effective_severity(f))
            .collect();

        let highest = effective.iter().map(|f| self.effective_severity(f)).max();
        let failed = violations.iter().any(|&sev| sev >= self.fail_on);

        PolicyVerdict {
            pass: !failed,
            total_findings: findings.len(),
            effective_findings: effective.len(),
            non_compliant_findings: violations.len(),
            highest_severity: highest,
            fail_threshold: self.fail_on,
        }
    }

    /// Filter findings: remove ignored categories, apply overrides.
    pub fn apply(&self, findings: &[Finding]) -> Vec<Finding> {
        findings
            .iter()
            .filter(|f| !self.ignore_categories.contains(&f.category))
            .map(|f| {
                let mut f = f.clone();
                f.severity = self.effective_severity(&f);
                f
            })
            .collect()
    }
}
