//! fipsscan: FIPS compliance scanner for crypto API usage.
//!
//! Finds calls to sensitive crypto factory APIs in a program model, resolves
//! the algorithm argument of each call (tracing parameters back through the
//! call graph when needed) and classifies the provider argument against the
//! FIPS-validated allow-list.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use fipsscan::{scan, ScanOptions};
//!
//! let options = ScanOptions::default();
//! let report = scan(Path::new("./build/program-model"), &options).unwrap();
//! println!("Pass: {}, Findings: {}", report.verdict.pass, report.findings.len());
//! ```

pub mod adapter;
pub mod analysis;
pub mod config;
pub mod error;
pub mod ir;
pub mod output;
pub mod rules;

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use config::Config;
use error::Result;
use output::{OutputFormat, ReportView};
use rules::policy::PolicyVerdict;
use rules::{Finding, RuleSet};

pub use analysis::scan_program;

/// Name of the per-project config file looked up next to the scan target.
pub const CONFIG_FILE: &str = ".fipsscan.toml";

/// Options for a scan invocation.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Path to config file (defaults to `.fipsscan.toml` next to the target).
    pub config_path: Option<PathBuf>,
    /// Rule file overriding both the config and the built-in rules.
    pub rules_path: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// CLI override for fail_on threshold.
    pub fail_on_override: Option<rules::Severity>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            rules_path: None,
            format: OutputFormat::Console,
            fail_on_override: None,
        }
    }
}

/// Complete scan report.
#[derive(Debug)]
pub struct ScanReport {
    pub target_name: String,
    pub findings: Vec<Finding>,
    pub verdict: PolicyVerdict,
    /// Hex SHA-256 of the serialized findings.
    pub fingerprint: String,
}

/// Run a complete scan: load config, rules and program model, analyze,
/// evaluate policy.
pub fn scan(path: &Path, options: &ScanOptions) -> Result<ScanReport> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| default_config_path(path));
    let mut config = Config::load(&config_path)?;

    if let Some(fail_on) = options.fail_on_override {
        config.policy.fail_on = fail_on;
    }

    let rules = load_rules(options.rules_path.as_deref().or(config.rules.as_deref()))?;
    let program = adapter::load_program(path)?;

    let all_findings = scan_program(&program, &rules, &config.analysis);

    let effective_findings = config.policy.apply(&all_findings);
    let verdict = config.policy.evaluate(&all_findings);
    let fingerprint = fingerprint(&effective_findings)?;

    Ok(ScanReport {
        target_name: program.name.clone(),
        findings: effective_findings,
        verdict,
        fingerprint,
    })
}

/// Rules from `path`, or the built-in JCA rules when none is given.
pub fn load_rules(path: Option<&Path>) -> Result<RuleSet> {
    match path {
        Some(p) => rules::loader::load(p),
        None => rules::builtin::default_rules(),
    }
}

/// Render a scan report in the specified format.
pub fn render_report(report: &ScanReport, format: OutputFormat) -> Result<String> {
    output::render(
        &ReportView {
            target_name: &report.target_name,
            findings: &report.findings,
            verdict: &report.verdict,
            fingerprint: &report.fingerprint,
        },
        format,
    )
}

fn default_config_path(target: &Path) -> PathBuf {
    if target.is_dir() {
        target.join(CONFIG_FILE)
    } else {
        target
            .parent()
            .map(|dir| dir.join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }
}

fn fingerprint(findings: &[Finding]) -> Result<String> {
    let bytes = serde_json::to_vec(findings)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
