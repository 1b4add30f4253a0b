//! Scan orchestration: matching, resolution and evaluation over a program.

pub mod compliance;
pub mod constant_propagation;
pub mod resolver;

use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::ir::{Method, Program};
use crate::rules::{Finding, FindingBuilder, RuleMatcher, RuleSet};

use resolver::ArgumentResolver;

/// Drives the rule matcher, resolver and compliance evaluator over every
/// analyzable method of a program.
///
/// Output order is class order, then call-site order within a method, then
/// rule order, whether or not methods are analyzed in parallel.
pub struct Scanner<'a> {
    program: &'a Program,
    matcher: RuleMatcher<'a>,
    resolver: ArgumentResolver<'a>,
    parallel: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(program: &'a Program, rules: &'a RuleSet, config: &AnalysisConfig) -> Self {
        Self {
            program,
            matcher: RuleMatcher::new(rules),
            resolver: ArgumentResolver::new(program).with_max_depth(config.depth_bound()),
            parallel: config.parallel,
        }
    }

    pub fn run(&self) -> Vec<Finding> {
        let methods: Vec<&Method> = self.program.methods_in_order().collect();
        tracing::info!(
            program = %self.program.name,
            methods = methods.len(),
            edges = self.program.call_graph().edge_count(),
            parallel = self.parallel,
            "starting scan"
        );

        let per_method: Vec<Vec<Finding>> = if self.parallel {
            methods.par_iter().map(|m| self.scan_method(m)).collect()
        } else {
            methods.iter().map(|m| self.scan_method(m)).collect()
        };
        let findings: Vec<Finding> = per_method.into_iter().flatten().collect();

        tracing::info!(findings = findings.len(), "scan complete");
        findings
    }

    fn scan_method(&self, method: &Method) -> Vec<Finding> {
        let Some(call_sites) = method.analyzable_body() else {
            tracing::debug!(method = %method.qualified_name, "no analyzable body, skipping");
            return Vec::new();
        };

        let mut findings = Vec::new();
        for call_site in call_sites {
            for rule in self.matcher.matching(call_site) {
                tracing::debug!(
                    method = %method.qualified_name,
                    rule = %rule.id,
                    line = ?call_site.line(),
                    "rule matched call site"
                );
                // The matcher guarantees the algorithm argument exists.
                let algorithm = call_site
                    .argument(rule.algorithm_arg_index)
                    .map(|arg| self.resolver.resolve(arg, method.id))
                    .unwrap_or_else(resolver::ResolvedValue::unresolved);
                let (provider, verdict) = compliance::evaluate(call_site, rule);
                findings.push(
                    FindingBuilder::new(rule, method, call_site).build(algorithm, provider, verdict),
                );
            }
        }
        findings
    }
}

/// Run a full scan of `program` against `rules`.
pub fn scan_program(program: &Program, rules: &RuleSet, config: &AnalysisConfig) -> Vec<Finding> {
    Scanner::new(program, rules, config).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ArgumentValue, ProgramBuilder};
    use crate::rules::{ComplianceVerdict, Provenance, RawRule};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const DIGEST: &str = "java.security.MessageDigest";

    fn digest_rules() -> RuleSet {
        RuleSet::from_raw(vec![RawRule {
            category: "MessageDigest".into(),
            declaring_type: DIGEST.into(),
            method_name: "getInstance".into(),
            algorithm_arg_index: 0,
            provider_arg_index: Some(1),
            match_pattern: Some("^MD5$".into()),
            ..Default::default()
        }])
        .unwrap()
    }

    fn lit(s: &str) -> ArgumentValue {
        ArgumentValue::literal(s)
    }

    fn sequential() -> AnalysisConfig {
        AnalysisConfig {
            parallel: false,
            ..Default::default()
        }
    }

    #[test]
    fn traced_algorithm_with_non_fips_provider() {
        let mut b = ProgramBuilder::new("t");
        let digest = b.method("com.acme.Hashing", "digest", &["algorithm"]);
        b.call(
            digest,
            DIGEST,
            "getInstance",
            vec![ArgumentValue::ParameterRef(0), lit("SunJCE")],
            Some(21),
        );
        let main = b.method("com.acme.App", "main", &["args"]);
        b.call_method(main, digest, vec![lit("MD5")], Some(8));
        let program = b.build();
        let rules = digest_rules();

        let findings = scan_program(&program, &rules, &sequential());
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.resolved_algorithm, "MD5");
        assert_eq!(f.algorithm_provenance, Provenance::TracedRecursively);
        assert_eq!(f.resolved_provider, "SunJCE");
        assert_eq!(f.provider_verdict, ComplianceVerdict::NonFips);
        assert_eq!(f.class_name, "com.acme.Hashing");
        assert_eq!(f.line(), Some(21));
        assert!(f.algorithm_flagged);
    }

    #[test]
    fn bodiless_methods_are_skipped() {
        let mut b = ProgramBuilder::new("t");
        let abs = b.bodiless_method("com.acme.Api", "hash", &["a"]);
        b.call(abs, DIGEST, "getInstance", vec![lit("MD5")], None);
        let program = b.build();

        assert!(scan_program(&program, &digest_rules(), &sequential()).is_empty());
    }

    #[test]
    fn one_finding_per_matching_rule_in_rule_order() {
        let rules = RuleSet::from_raw(vec![
            RawRule {
                category: "first".into(),
                declaring_type: DIGEST.into(),
                method_name: "getInstance".into(),
                ..Default::default()
            },
            RawRule {
                category: "second".into(),
                declaring_type: DIGEST.into(),
                method_name: "getInstance".into(),
                provider_arg_index: Some(1),
                ..Default::default()
            },
        ])
        .unwrap();
        let mut b = ProgramBuilder::new("t");
        let m = b.method("C", "m", &[]);
        b.call(m, DIGEST, "getInstance", vec![lit("SHA-256"), lit("BCFIPS")], None);
        let program = b.build();

        let findings = scan_program(&program, &rules, &sequential());
        let categories: Vec<&str> = findings.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(categories, vec!["first", "second"]);
        assert_eq!(findings[0].provider_verdict, ComplianceVerdict::NotApplicable);
        assert_eq!(findings[1].provider_verdict, ComplianceVerdict::Fips);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let mut b = ProgramBuilder::new("t");
        let mut sinks = Vec::new();
        for i in 0..40 {
            let sink = b.method(&format!("com.acme.C{}", i % 7), &format!("m{i}"), &["a"]);
            b.call(
                sink,
                DIGEST,
                "getInstance",
                vec![ArgumentValue::ParameterRef(0), lit("SunJCE")],
                Some(i),
            );
            sinks.push(sink);
        }
        let main = b.method("com.acme.Main", "main", &[]);
        for (i, sink) in sinks.iter().enumerate() {
            let algo = if i % 2 == 0 { "MD5" } else { "SHA-256" };
            b.call_method(main, *sink, vec![lit(algo)], None);
        }
        let program = b.build();
        let rules = digest_rules();

        let seq = scan_program(&program, &rules, &sequential());
        let par = scan_program(&program, &rules, &AnalysisConfig::default());
        assert_eq!(seq, par);
        assert_eq!(seq.len(), 40);
    }

    /// Random forwarding graph: every method calls `getInstance` with its
    /// own parameter, then makes the listed calls into other methods.
    fn random_program(methods: usize, calls: &[(usize, usize, u8)]) -> Program {
        let mut b = ProgramBuilder::new("random");
        let ids: Vec<_> = (0..methods)
            .map(|i| b.method(&format!("com.acme.C{}", i % 3), &format!("m{i}"), &["a", "b"]))
            .collect();
        for (i, id) in ids.iter().enumerate() {
            let provider = if i % 2 == 0 { lit("BCFIPS") } else { ArgumentValue::ParameterRef(1) };
            b.call(
                *id,
                DIGEST,
                "getInstance",
                vec![ArgumentValue::ParameterRef(0), provider],
                Some(i as u32),
            );
        }
        for &(from, to, kind) in calls {
            let arg = match kind {
                0 => ArgumentValue::ParameterRef(0),
                1 => ArgumentValue::ParameterRef(1),
                2 => lit("MD5"),
                3 => lit("SHA-256"),
                _ => ArgumentValue::Unsupported,
            };
            b.call_method(ids[from % methods], ids[to % methods], vec![arg, lit("SunJCE")], None);
        }
        b.build()
    }

    proptest! {
        #[test]
        fn parallel_matches_sequential_on_random_graphs(
            methods in 1usize..12,
            calls in prop::collection::vec((0usize..12, 0usize..12, 0u8..5), 0..40),
        ) {
            let program = random_program(methods, &calls);
            let rules = digest_rules();

            let seq = scan_program(&program, &rules, &sequential());
            let par = scan_program(&program, &rules, &AnalysisConfig::default());
            prop_assert_eq!(&seq, &par);
            prop_assert_eq!(seq.len(), methods);
        }
    }
}
