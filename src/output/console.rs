use super::{algorithm_label, line_label, ReportView};
use crate::rules::{ComplianceVerdict, Finding, Severity};

/// Render findings as plain console output, grouped by severity (most
/// severe first) with scan order kept inside each severity.
pub fn render(view: &ReportView<'_>) -> String {
    let findings = view.findings;
    let verdict = view.verdict;
    let mut output = String::new();

    if findings.is_empty() {
        output.push_str("\n  No sensitive crypto API usage detected.\n\n");
        return output;
    }

    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

    output.push_str(&format!("\n  {} finding(s) detected:\n\n", findings.len()));

    for finding in &sorted {
        let severity_tag = match finding.severity {
            Severity::Critical => "[CRITICAL]",
            Severity::High => "[HIGH]    ",
            Severity::Medium => "[MEDIUM]  ",
            Severity::Low => "[LOW]     ",
            Severity::Info => "[INFO]    ",
        };
        let status = if finding.is_non_compliant() {
            "NON-COMPLIANT"
        } else if finding.has_unresolved() {
            "REVIEW"
        } else {
            "ok"
        };

        output.push_str(&format!(
            "  {} {} {} ({})\n",
            severity_tag, finding.category, finding.api, status
        ));
        output.push_str(&format!(
            "           at {}: {} line {}\n",
            finding.class_name,
            finding.method_signature,
            line_label(finding)
        ));

        let mut algorithm = format!(
            "           algorithm: {} ({})",
            algorithm_label(finding),
            finding.algorithm_provenance
        );
        if !finding.algorithm_trace.is_empty() {
            algorithm.push_str(&format!(" via {}", finding.algorithm_trace.join(" -> ")));
        }
        if finding.algorithm_flagged {
            algorithm.push_str(" [weak]");
        }
        output.push_str(&algorithm);
        output.push('\n');

        if finding.provider_verdict != ComplianceVerdict::NotApplicable {
            output.push_str(&format!(
                "           provider:  {} [{}]\n",
                finding.resolved_provider, finding.provider_verdict
            ));
        }
        output.push('\n');
    }

    let status = if verdict.pass { "PASS" } else { "FAIL" };
    output.push_str(&format!(
        "  Result: {} ({} non-compliant, threshold: {}, highest: {})\n\n",
        status,
        verdict.non_compliant_findings,
        verdict.fail_threshold,
        verdict
            .highest_severity
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".into()),
    ));

    output
}
