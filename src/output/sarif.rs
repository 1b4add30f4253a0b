use std::collections::BTreeMap;

use serde_json::{json, Value};

use super::{algorithm_label, ReportView};
use crate::error::Result;
use crate::rules::{Finding, Severity};

/// Render findings as SARIF 2.1.0.
///
/// Every matched call site becomes a result. Compliant ones are reported at
/// `note` level so the inventory stays complete.
pub fn render(view: &ReportView<'_>) -> Result<String> {
    let findings = view.findings;

    let mut by_rule: BTreeMap<&str, &Finding> = BTreeMap::new();
    for f in findings {
        by_rule.entry(f.rule_id.as_str()).or_insert(f);
    }
    let rules: Vec<Value> = by_rule
        .values()
        .map(|f| {
            json!({
                "id": f.rule_id,
                "name": f.category,
                "shortDescription": { "text": f.api },
                "fullDescription": { "text": f.description },
                "defaultConfiguration": {
                    "level": severity_to_sarif_level(f.severity),
                },
            })
        })
        .collect();

    let results: Vec<Value> = findings
        .iter()
        .map(|f| {
            let mut result = json!({
                "ruleId": f.rule_id,
                "level": result_level(f),
                "message": { "text": message(f) },
                "properties": {
                    "class": f.class_name,
                    "method": f.method_signature,
                    "algorithm": f.resolved_algorithm,
                    "resolution": f.algorithm_provenance,
                    "trace": f.algorithm_trace,
                    "provider": f.resolved_provider,
                    "providerStatus": f.provider_verdict,
                },
            });

            if let Some(loc) = &f.location {
                let uri = loc
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| f.class_name.replace('.', "/"));
                result["locations"] = json!([{
                    "physicalLocation": {
                        "artifactLocation": { "uri": uri },
                        "region": { "startLine": loc.line },
                    },
                }]);
            }

            result
        })
        .collect();

    let sarif = json!({
        "$schema": "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "fipsscan",
                    "version": env!("CARGO_PKG_VERSION"),
                    "semanticVersion": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                },
            },
            "results": results,
            "automationDetails": {
                "id": format!("fipsscan/{}", view.target_name),
                "guid": uuid::Uuid::new_v4().to_string(),
            },
            "properties": {
                "fingerprint": view.fingerprint,
            },
        }],
    });

    let output = serde_json::to_string_pretty(&sarif)?;
    Ok(output)
}

fn message(f: &Finding) -> String {
    format!(
        "{} with algorithm {} ({}) and provider {} [{}]",
        f.api,
        algorithm_label(f),
        f.algorithm_provenance,
        f.resolved_provider,
        f.provider_verdict
    )
}

fn result_level(f: &Finding) -> &'static str {
    if f.is_non_compliant() {
        severity_to_sarif_level(f.severity)
    } else if f.has_unresolved() {
        "warning"
    } else {
        "note"
    }
}

fn severity_to_sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Info => "note",
    }
}
