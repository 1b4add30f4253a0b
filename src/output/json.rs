use chrono::Utc;
use serde::Serialize;

use super::ReportView;
use crate::error::Result;
use crate::rules::policy::PolicyVerdict;
use crate::rules::Finding;

#[derive(Serialize)]
struct JsonReport<'a> {
    target: &'a str,
    generated_at: String,
    fingerprint: &'a str,
    findings: &'a [Finding],
    verdict: &'a PolicyVerdict,
}

/// Render findings as a JSON report. Identical scans differ only in
/// `generated_at`; compare `fingerprint` to diff them.
pub fn render(view: &ReportView<'_>) -> Result<String> {
    let report = JsonReport {
        target: view.target_name,
        generated_at: Utc::now().to_rfc3339(),
        fingerprint: view.fingerprint,
        findings: view.findings,
        verdict: view.verdict,
    };
    let json = serde_json::to_string_pretty(&report)?;
    Ok(json)
}
