pub mod builtin;
pub mod finding;
pub mod loader;
pub mod policy;

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::ir::CallSite;

pub use finding::{ComplianceVerdict, Finding, FindingBuilder, Provenance, Severity};

/// A rule as written in a rule file, before validation.
///
/// Accepts the legacy camelCase keys alongside snake_case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRule {
    #[serde(default)]
    pub id: Option<String>,
    pub category: String,
    #[serde(alias = "className", alias = "class_name")]
    pub declaring_type: String,
    #[serde(alias = "methodName")]
    pub method_name: String,
    #[serde(alias = "algoArgIndex", alias = "algo_arg_index")]
    pub algorithm_arg_index: i64,
    #[serde(default, alias = "providerArgIndex")]
    pub provider_arg_index: Option<i64>,
    #[serde(default, alias = "matchPattern", alias = "match")]
    pub match_pattern: Option<String>,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
}

fn default_severity() -> Severity {
    Severity::High
}

impl Default for RawRule {
    fn default() -> Self {
        Self {
            id: None,
            category: String::new(),
            declaring_type: String::new(),
            method_name: String::new(),
            algorithm_arg_index: 0,
            provider_arg_index: None,
            match_pattern: None,
            severity: default_severity(),
            description: String::new(),
        }
    }
}

impl RawRule {
    /// Check invariants and compile the match pattern.
    ///
    /// `position` is the rule's index in its file, used in error messages.
    pub fn validate(self, position: usize) -> Result<Rule> {
        let label = self
            .id
            .clone()
            .unwrap_or_else(|| format!("#{position} {}.{}", self.declaring_type, self.method_name));
        let fail = |message: String| ScanError::Rule {
            rule: label.clone(),
            message,
        };

        if self.declaring_type.trim().is_empty() || self.method_name.trim().is_empty() {
            return Err(fail("declaring type and method name are required".into()));
        }
        let algorithm_arg_index = usize::try_from(self.algorithm_arg_index).map_err(|_| {
            fail(format!(
                "algorithm_arg_index must be non-negative, got {}",
                self.algorithm_arg_index
            ))
        })?;
        let provider_arg_index = match self.provider_arg_index {
            None => None,
            Some(raw) => {
                let idx = usize::try_from(raw).map_err(|_| {
                    fail(format!("provider_arg_index must be non-negative, got {raw}"))
                })?;
                if idx == algorithm_arg_index {
                    return Err(fail(format!(
                        "provider_arg_index {idx} collides with algorithm_arg_index"
                    )));
                }
                Some(idx)
            }
        };
        let matcher = match &self.match_pattern {
            Some(pattern) => Some(
                Regex::new(pattern).map_err(|e| fail(format!("invalid match_pattern: {e}")))?,
            ),
            None => None,
        };

        let id = self.id.unwrap_or_else(|| {
            format!(
                "{}:{}.{}",
                self.category, self.declaring_type, self.method_name
            )
        });

        Ok(Rule {
            id,
            category: self.category,
            declaring_type: self.declaring_type,
            method_name: self.method_name,
            algorithm_arg_index,
            provider_arg_index,
            match_pattern: self.match_pattern,
            severity: self.severity,
            description: self.description,
            matcher,
        })
    }
}

/// One validated sensitive-API pattern. Immutable for the scan's lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub id: String,
    pub category: String,
    pub declaring_type: String,
    pub method_name: String,
    pub algorithm_arg_index: usize,
    pub provider_arg_index: Option<usize>,
    pub match_pattern: Option<String>,
    pub severity: Severity,
    pub description: String,
    #[serde(skip)]
    matcher: Option<Regex>,
}

impl Rule {
    pub fn api(&self) -> String {
        format!("{}.{}", self.declaring_type, self.method_name)
    }

    /// Whether `algorithm` matches this rule's weak-algorithm pattern.
    pub fn matches_algorithm(&self, algorithm: &str) -> bool {
        self.matcher
            .as_ref()
            .map(|re| re.is_match(algorithm))
            .unwrap_or(false)
    }

    /// Exact type and method name match, with the algorithm argument present.
    pub fn applies_to(&self, call_site: &CallSite) -> bool {
        self.declaring_type == call_site.declaring_type
            && self.method_name == call_site.method_name
            && self.algorithm_arg_index < call_site.arity()
    }
}

/// Ordered collection of validated rules.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Validate every raw rule; the first malformed one aborts.
    pub fn from_raw(raw: Vec<RawRule>) -> Result<Self> {
        let rules = raw
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.validate(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Finds the rules that apply to a call site.
///
/// Rules are indexed by `(declaring_type, method_name)`; results keep rule
/// order.
pub struct RuleMatcher<'a> {
    rules: &'a RuleSet,
    by_api: HashMap<(&'a str, &'a str), Vec<usize>>,
}

impl<'a> RuleMatcher<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        let mut by_api: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
        for (i, rule) in rules.rules.iter().enumerate() {
            by_api
                .entry((rule.declaring_type.as_str(), rule.method_name.as_str()))
                .or_default()
                .push(i);
        }
        Self { rules, by_api }
    }

    /// Every rule whose API equals the call site's target and whose
    /// algorithm index is within the call site's arity.
    pub fn matching(&self, call_site: &CallSite) -> Vec<&'a Rule> {
        let key = (call_site.declaring_type.as_str(), call_site.method_name.as_str());
        self.by_api
            .get(&key)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| &self.rules.rules[i])
                    .filter(|r| r.applies_to(call_site))
                    .collect()
            })
            .unwrap_or_default()
    }
}
