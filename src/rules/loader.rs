use std::path::Path;

use serde::Deserialize;

use super::{RawRule, RuleSet};
use crate::error::{Result, ScanError};

/// Top-level shape of a rule file: a `rules` list.
#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RawRule>,
}

/// Load and validate rules from a YAML or TOML file.
///
/// The first malformed rule aborts loading.
pub fn load(path: &Path) -> Result<RuleSet> {
    let content = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let file: RuleFile = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        _ => return Err(ScanError::RuleFormat(path.display().to_string())),
    };

    let rules = RuleSet::from_raw(file.rules)?;
    tracing::debug!(path = %path.display(), rules = rules.len(), "loaded rule file");
    Ok(rules)
}
