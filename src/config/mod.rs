use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::resolver::DEFAULT_MAX_DEPTH;
use crate::error::Result;
use crate::rules::policy::Policy;

/// Top-level configuration from `.fipsscan.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Rule file; the built-in rule set is used when absent.
    #[serde(default)]
    pub rules: Option<PathBuf>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub policy: Policy,
}

/// Engine settings, built once per scan and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum methods on one resolution path; 0 disables the bound.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Analyze methods on the rayon thread pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_parallel() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            parallel: default_parallel(),
        }
    }
}

impl AnalysisConfig {
    pub fn depth_bound(&self) -> Option<usize> {
        (self.max_depth > 0).then_some(self.max_depth)
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    ///
    /// A relative `rules` path is resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        if let Some(dir) = path.parent() {
            config.rules = config
                .rules
                .take()
                .map(|rules| if rules.is_relative() { dir.join(rules) } else { rules });
        }
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# fipsscan configuration

# Rule file (YAML or TOML). The built-in JCA rules are used when unset.
# rules = "fips-rules.yaml"

[analysis]
# Maximum number of methods on one interprocedural resolution path (0 = unbounded).
max_depth = 32
# Analyze methods in parallel.
parallel = true

[policy]
# Minimum severity of a non-compliant finding that fails the scan.
fail_on = "high"

# Treat unresolved algorithms and providers as non-compliant.
fail_on_unresolved = false

# Rule categories to drop from the report.
# ignore_categories = ["KeyFactory"]

# Per-category severity overrides.
# [policy.overrides]
# "SecureRandom" = "info"
"#
    }
}
