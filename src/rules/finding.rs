use serde::{Deserialize, Serialize};

use crate::analysis::resolver::ResolvedValue;
use crate::ir::{CallSite, Method, SourceLocation};

use super::Rule;

/// A sensitive-API usage found at one call site for one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub category: String,
    /// Invoked API, `declaring_type.method_name`.
    pub api: String,
    pub severity: Severity,
    pub description: String,
    /// Class declaring the method that contains the call site.
    pub class_name: String,
    /// Sub-signature of the method that contains the call site.
    pub method_signature: String,
    pub resolved_algorithm: String,
    pub algorithm_provenance: Provenance,
    /// Methods the algorithm value passed through, literal holder first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub algorithm_trace: Vec<String>,
    /// Whether the resolved algorithm matched the rule's pattern.
    pub algorithm_flagged: bool,
    pub location: Option<SourceLocation>,
    pub resolved_provider: String,
    pub provider_verdict: ComplianceVerdict,
}

impl Finding {
    pub fn line(&self) -> Option<u32> {
        self.location.as_ref().map(|l| l.line)
    }

    /// Provider is known-bad or the algorithm matched a weak-algorithm pattern.
    pub fn is_non_compliant(&self) -> bool {
        self.provider_verdict == ComplianceVerdict::NonFips || self.algorithm_flagged
    }

    pub fn has_unresolved(&self) -> bool {
        self.algorithm_provenance == Provenance::Unresolved
            || self.provider_verdict == ComplianceVerdict::Unresolved
    }
}

/// How a resolved value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    DirectConstant,
    TracedRecursively,
    Unresolved,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectConstant => write!(f, "direct constant"),
            Self::TracedRecursively => write!(f, "traced recursively"),
            Self::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Provider compliance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceVerdict {
    #[serde(rename = "fips")]
    Fips,
    #[serde(rename = "non_fips")]
    NonFips,
    #[serde(rename = "unresolved")]
    Unresolved,
    #[serde(rename = "not_applicable")]
    NotApplicable,
}

impl std::fmt::Display for ComplianceVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fips => write!(f, "FIPS"),
            Self::NonFips => write!(f, "Non-FIPS"),
            Self::Unresolved => write!(f, "unresolved"),
            Self::NotApplicable => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Assembles a `Finding` from a matched call site and its resolved values.
pub struct FindingBuilder<'a> {
    rule: &'a Rule,
    method: &'a Method,
    call_site: &'a CallSite,
}

impl<'a> FindingBuilder<'a> {
    pub fn new(rule: &'a Rule, method: &'a Method, call_site: &'a CallSite) -> Self {
        Self {
            rule,
            method,
            call_site,
        }
    }

    pub fn build(
        self,
        algorithm: ResolvedValue,
        provider: String,
        provider_verdict: ComplianceVerdict,
    ) -> Finding {
        let algorithm_flagged =
            algorithm.is_resolved() && self.rule.matches_algorithm(&algorithm.value);

        Finding {
            rule_id: self.rule.id.clone(),
            category: self.rule.category.clone(),
            api: self.call_site.target(),
            severity: self.rule.severity,
            description: self.rule.description.clone(),
            class_name: self.method.class_name.clone(),
            method_signature: self.method.signature.clone(),
            resolved_algorithm: algorithm.value,
            algorithm_provenance: algorithm.provenance,
            algorithm_trace: algorithm.trace,
            algorithm_flagged,
            location: self.call_site.location.clone(),
            resolved_provider: provider,
            provider_verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ArgumentValue, MethodId};
    use crate::rules::RawRule;

    fn weak_digest_rule() -> Rule {
        RawRule {
            category: "weak-hash".into(),
            declaring_type: "java.security.MessageDigest".into(),
            method_name: "getInstance".into(),
            algorithm_arg_index: 0,
            provider_arg_index: Some(1),
            match_pattern: Some("(?i)^(MD5|SHA-?1)$".into()),
            ..Default::default()
        }
        .validate(0)
        .unwrap()
    }

    fn method() -> Method {
        Method {
            id: MethodId(0),
            qualified_name: "com.acme.App.run".into(),
            class_name: "com.acme.App".into(),
            name: "run".into(),
            signature: "void run()".into(),
            parameters: vec![],
            is_concrete: true,
            body: None,
        }
    }

    fn site() -> CallSite {
        CallSite {
            caller: MethodId(0),
            index: 0,
            declaring_type: "java.security.MessageDigest".into(),
            method_name: "getInstance".into(),
            arguments: vec![ArgumentValue::literal("MD5")],
            location: None,
        }
    }

    #[test]
    fn builds_finding_with_unknown_line() {
        let rule = weak_digest_rule();
        let m = method();
        let cs = site();
        let finding = FindingBuilder::new(&rule, &m, &cs).build(
            ResolvedValue::direct("MD5"),
            "none".into(),
            ComplianceVerdict::NotApplicable,
        );
        assert_eq!(finding.line(), None);
        assert_eq!(finding.api, "java.security.MessageDigest.getInstance");
        assert_eq!(finding.method_signature, "void run()");
        assert!(finding.algorithm_flagged);
        assert!(finding.is_non_compliant());
    }

    #[test]
    fn unresolved_algorithm_is_never_flagged() {
        let rule = weak_digest_rule();
        let m = method();
        let cs = site();
        let finding = FindingBuilder::new(&rule, &m, &cs).build(
            ResolvedValue::unresolved(),
            "unknown".into(),
            ComplianceVerdict::Unresolved,
        );
        assert!(!finding.algorithm_flagged);
        assert!(finding.has_unresolved());
        assert!(!finding.is_non_compliant());
    }

    #[test]
    fn verdict_serializes_snake_case() {
        let json = serde_json::to_string(&ComplianceVerdict::NonFips).unwrap();
        assert_eq!(json, "\"non_fips\"");
    }
}
