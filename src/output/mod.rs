pub mod console;
pub mod html;
pub mod json;
pub mod sarif;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::policy::PolicyVerdict;
use crate::rules::{Finding, Provenance};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Html,
    Sarif,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Some(Self::Console),
            "json" => Some(Self::Json),
            "html" => Some(Self::Html),
            "sarif" => Some(Self::Sarif),
            _ => None,
        }
    }
}

/// Everything a renderer needs about one scan.
pub struct ReportView<'a> {
    pub target_name: &'a str,
    pub findings: &'a [Finding],
    pub verdict: &'a PolicyVerdict,
    pub fingerprint: &'a str,
}

/// Render findings into the specified format.
pub fn render(view: &ReportView<'_>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render(view)),
        OutputFormat::Json => json::render(view),
        OutputFormat::Html => Ok(html::render(view)),
        OutputFormat::Sarif => sarif::render(view),
    }
}

/// Algorithm column text: the value, or a marker when unresolved.
pub(crate) fn algorithm_label(finding: &Finding) -> &str {
    match finding.algorithm_provenance {
        Provenance::Unresolved => "<unresolved>",
        Provenance::DirectConstant | Provenance::TracedRecursively => &finding.resolved_algorithm,
    }
}

pub(crate) fn line_label(finding: &Finding) -> String {
    finding
        .line()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "?".into())
}
