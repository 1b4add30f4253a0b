//! Provider classification against the FIPS-validated allow-list.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::ir::{ArgumentValue, CallSite};
use crate::rules::{ComplianceVerdict, Rule};

/// Provider names treated as FIPS-validated. Exact, case-sensitive.
static FIPS_PROVIDERS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["SunPKCS11", "BCFIPS", "OpenJCEPlusFIPS"]));

pub const NO_PROVIDER: &str = "none";
pub const UNKNOWN_PROVIDER: &str = "unknown";

pub fn is_fips_provider(name: &str) -> bool {
    FIPS_PROVIDERS.contains(name)
}

/// Allow-listed provider names in a stable order, for reports.
pub fn fips_providers() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = FIPS_PROVIDERS.iter().copied().collect();
    names.sort_unstable();
    names
}

/// Classify the provider argument a rule watches at `call_site`.
///
/// Only literal providers are classified; the provider argument is not
/// traced through callers.
pub fn evaluate(call_site: &CallSite, rule: &Rule) -> (String, ComplianceVerdict) {
    let Some(index) = rule.provider_arg_index else {
        return (NO_PROVIDER.into(), ComplianceVerdict::NotApplicable);
    };
    match call_site.argument(index) {
        None => (NO_PROVIDER.into(), ComplianceVerdict::NotApplicable),
        Some(arg) => classify(arg),
    }
}

/// Verdict for one provider argument value.
pub fn classify(provider: &ArgumentValue) -> (String, ComplianceVerdict) {
    match provider {
        ArgumentValue::Literal(name) if is_fips_provider(name) => {
            (name.clone(), ComplianceVerdict::Fips)
        }
        ArgumentValue::Literal(name) => (name.clone(), ComplianceVerdict::NonFips),
        ArgumentValue::ParameterRef(_) | ArgumentValue::Unsupported => {
            (UNKNOWN_PROVIDER.into(), ComplianceVerdict::Unresolved)
        }
    }
}
