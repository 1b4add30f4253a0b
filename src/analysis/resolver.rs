//! Interprocedural argument resolution.
//!
//! Given a call-site argument and the method that owns it, walk backward
//! through the call graph until a caller supplies a string literal for the
//! watched parameter.
//!
//! The walk is a depth-first search over incoming edges with an explicit
//! stack. Methods already on the current path are dead ends, so cyclic call
//! graphs terminate and only simple paths are explored. The first literal
//! found in edge enumeration order wins; a parameter fed different literals
//! by different callers reports only the first one.
//!
//! A `(method, parameter)` pair whose whole sub-search fails without running
//! into the path or depth cut fails the same way on every path, so it is
//! remembered for the rest of the resolution and not searched again. This
//! keeps forwarding-heavy acyclic graphs linear in their edge count.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ir::{ArgumentValue, MethodId, Program};
use crate::rules::Provenance;

/// Default bound on the number of methods on one resolution path.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Result of resolving one argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedValue {
    pub value: String,
    pub provenance: Provenance,
    /// Qualified names of the methods the value passed through, starting at
    /// the caller holding the literal and ending at the owning method.
    pub trace: Vec<String>,
}

impl ResolvedValue {
    pub fn direct(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            provenance: Provenance::DirectConstant,
            trace: Vec::new(),
        }
    }

    pub fn traced(value: impl Into<String>, trace: Vec<String>) -> Self {
        Self {
            value: value.into(),
            provenance: Provenance::TracedRecursively,
            trace,
        }
    }

    pub fn unresolved() -> Self {
        Self {
            value: String::new(),
            provenance: Provenance::Unresolved,
            trace: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.provenance != Provenance::Unresolved
    }
}

/// One method on the current resolution path.
struct Frame {
    method: MethodId,
    param: usize,
    next_edge: usize,
    /// Some edge below this frame was cut by the path or depth check, so its
    /// failure depends on the current path.
    cut: bool,
}

/// Traces argument values through the program's call graph.
///
/// Holds only shared references; each `resolve` call owns its own path
/// state, so one resolver can serve concurrent callers.
pub struct ArgumentResolver<'a> {
    program: &'a Program,
    max_depth: Option<usize>,
}

impl<'a> ArgumentResolver<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }

    /// Bound the number of methods on a path; `None` leaves only the cycle
    /// check.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve `argument` as it appears in a call site inside `owner`.
    pub fn resolve(&self, argument: &ArgumentValue, owner: MethodId) -> ResolvedValue {
        match argument {
            ArgumentValue::Literal(value) => ResolvedValue::direct(value.clone()),
            ArgumentValue::ParameterRef(index) => self
                .trace_parameter(owner, *index)
                .unwrap_or_else(ResolvedValue::unresolved),
            ArgumentValue::Unsupported => ResolvedValue::unresolved(),
        }
    }

    fn trace_parameter(&self, owner: MethodId, param: usize) -> Option<ResolvedValue> {
        let graph = self.program.call_graph();
        let mut on_path: HashSet<MethodId> = HashSet::from([owner]);
        let mut failed: HashSet<(MethodId, usize)> = HashSet::new();
        let mut stack = vec![Frame {
            method: owner,
            param,
            next_edge: 0,
            cut: false,
        }];

        while let Some(top) = stack.last_mut() {
            let edge = graph.edges_into(top.method).get(top.next_edge).copied();
            top.next_edge += 1;
            let param = top.param;

            let Some(edge) = edge else {
                if let Some(done) = stack.pop() {
                    on_path.remove(&done.method);
                    if !done.cut {
                        failed.insert((done.method, done.param));
                    } else if let Some(parent) = stack.last_mut() {
                        parent.cut = true;
                    }
                }
                continue;
            };

            let Some(site) = self.program.call_site(edge.call_site) else {
                continue;
            };

            match site.argument(param) {
                Some(ArgumentValue::Literal(value)) => {
                    let trace = std::iter::once(edge.caller())
                        .chain(stack.iter().rev().map(|f| f.method))
                        .filter_map(|id| self.program.method(id))
                        .map(|m| m.qualified_name.clone())
                        .collect();
                    tracing::trace!(
                        owner = owner.0,
                        value = %value,
                        depth = stack.len(),
                        "resolved parameter through callers"
                    );
                    return Some(ResolvedValue::traced(value.clone(), trace));
                }
                Some(ArgumentValue::ParameterRef(next)) => {
                    let caller = edge.caller();
                    if failed.contains(&(caller, *next)) {
                        continue;
                    }
                    let cut = if on_path.contains(&caller) {
                        tracing::trace!(method = caller.0, "cycle on resolution path");
                        true
                    } else if self.max_depth.is_some_and(|max| stack.len() >= max) {
                        tracing::trace!(method = caller.0, "resolution depth bound reached");
                        true
                    } else {
                        false
                    };
                    if cut {
                        if let Some(top) = stack.last_mut() {
                            top.cut = true;
                        }
                        continue;
                    }
                    on_path.insert(caller);
                    stack.push(Frame {
                        method: caller,
                        param: *next,
                        next_edge: 0,
                        cut: false,
                    });
                }
                Some(ArgumentValue::Unsupported) | None => continue,
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ProgramBuilder;

    fn lit(s: &str) -> ArgumentValue {
        ArgumentValue::literal(s)
    }

    fn param(i: usize) -> ArgumentValue {
        ArgumentValue::ParameterRef(i)
    }

    #[test]
    fn literal_is_direct_constant() {
        let program = ProgramBuilder::new("t").build();
        let resolved = ArgumentResolver::new(&program).resolve(&lit("SHA-256"), MethodId(0));
        assert_eq!(resolved, ResolvedValue::direct("SHA-256"));
    }

    #[test]
    fn unsupported_is_unresolved() {
        let program = ProgramBuilder::new("t").build();
        let resolved =
            ArgumentResolver::new(&program).resolve(&ArgumentValue::Unsupported, MethodId(0));
        assert_eq!(resolved.provenance, Provenance::Unresolved);
        assert_eq!(resolved.value, "");
    }

    #[test]
    fn single_hop_trace() {
        let mut b = ProgramBuilder::new("t");
        let sink = b.method("com.acme.Crypto", "digest", &["algorithm"]);
        let main = b.method("com.acme.App", "main", &[]);
        b.call_method(main, sink, vec![lit("MD5")], Some(4));
        let program = b.build();

        let resolved = ArgumentResolver::new(&program).resolve(&param(0), sink);
        assert_eq!(resolved.value, "MD5");
        assert_eq!(resolved.provenance, Provenance::TracedRecursively);
        assert_eq!(resolved.trace, vec!["com.acme.App.main", "com.acme.Crypto.digest"]);
    }

    #[test]
    fn multi_hop_trace_reorders_parameters() {
        let mut b = ProgramBuilder::new("t");
        let sink = b.method("C", "sink", &["algorithm"]);
        let mid = b.method("C", "mid", &["unused", "algo"]);
        let top = b.method("C", "top", &[]);
        b.call_method(mid, sink, vec![param(1)], None);
        b.call_method(top, mid, vec![lit("ignored"), lit("SHA1")], None);
        let program = b.build();

        let resolved = ArgumentResolver::new(&program).resolve(&param(0), sink);
        assert_eq!(resolved.value, "SHA1");
        assert_eq!(resolved.trace, vec!["C.top", "C.mid", "C.sink"]);
    }

    #[test]
    fn first_edge_wins() {
        let mut b = ProgramBuilder::new("t");
        let sink = b.method("C", "sink", &["algorithm"]);
        let a = b.method("C", "a", &[]);
        let c = b.method("C", "c", &[]);
        b.call_method(a, sink, vec![lit("MD5")], None);
        b.call_method(c, sink, vec![lit("SHA-256")], None);
        let program = b.build();

        let resolved = ArgumentResolver::new(&program).resolve(&param(0), sink);
        assert_eq!(resolved.value, "MD5");
    }

    #[test]
    fn failed_branch_falls_through_to_next_edge() {
        let mut b = ProgramBuilder::new("t");
        let sink = b.method("C", "sink", &["algorithm"]);
        let dead = b.method("C", "dead", &["x"]);
        let live = b.method("C", "live", &[]);
        b.call_method(dead, sink, vec![param(0)], None);
        b.call_method(live, sink, vec![lit("SHA-512")], None);
        let program = b.build();

        let resolved = ArgumentResolver::new(&program).resolve(&param(0), sink);
        assert_eq!(resolved.value, "SHA-512");
        assert_eq!(resolved.trace, vec!["C.live", "C.sink"]);
    }

    #[test]
    fn skips_unsupported_and_short_call_sites() {
        let mut b = ProgramBuilder::new("t");
        let sink = b.method("C", "sink", &["a", "algorithm"]);
        let short = b.method("C", "short", &[]);
        let opaque = b.method("C", "opaque", &[]);
        let good = b.method("C", "good", &[]);
        b.call_method(short, sink, vec![lit("x")], None);
        b.call_method(opaque, sink, vec![lit("x"), ArgumentValue::Unsupported], None);
        b.call_method(good, sink, vec![lit("x"), lit("AES")], None);
        let program = b.build();

        let resolved = ArgumentResolver::new(&program).resolve(&param(1), sink);
        assert_eq!(resolved.value, "AES");
    }

    #[test]
    fn mutual_recursion_terminates_unresolved() {
        let mut b = ProgramBuilder::new("t");
        let a = b.method("C", "a", &["algorithm"]);
        let bb = b.method("C", "b", &["algorithm"]);
        b.call_method(a, bb, vec![param(0)], None);
        b.call_method(bb, a, vec![param(0)], None);
        let program = b.build();

        let resolver = ArgumentResolver::new(&program).with_max_depth(None);
        assert_eq!(resolver.resolve(&param(0), a).provenance, Provenance::Unresolved);
        assert_eq!(resolver.resolve(&param(0), bb).provenance, Provenance::Unresolved);
    }

    #[test]
    fn self_recursion_is_dead_end_but_other_callers_resolve() {
        let mut b = ProgramBuilder::new("t");
        let rec = b.method("C", "rec", &["algorithm"]);
        let main = b.method("C", "main", &[]);
        b.call_method(rec, rec, vec![param(0)], None);
        b.call_method(main, rec, vec![lit("DES")], None);
        let program = b.build();

        let resolved = ArgumentResolver::new(&program).resolve(&param(0), rec);
        assert_eq!(resolved.value, "DES");
    }

    #[test]
    fn revisits_method_on_a_different_path() {
        // x is entered twice: first for its parameter 0 (dead end), then
        // through y for its parameter 1, which root grounds.
        let mut b = ProgramBuilder::new("t");
        let sink = b.method("C", "sink", &["p"]);
        let x = b.method("C", "x", &["a", "b"]);
        let y = b.method("C", "y", &["p"]);
        let root = b.method("C", "root", &[]);
        b.call_method(x, sink, vec![param(0)], None);
        b.call_method(y, sink, vec![param(0)], None);
        b.call_method(x, y, vec![param(1)], None);
        b.call_method(root, x, vec![ArgumentValue::Unsupported, lit("RC4")], None);
        let program = b.build();

        let resolved = ArgumentResolver::new(&program).resolve(&param(0), sink);
        assert_eq!(resolved.value, "RC4");
        assert_eq!(resolved.trace, vec!["C.root", "C.x", "C.y", "C.sink"]);
    }

    #[test]
    fn depth_bound_cuts_long_chains() {
        let mut b = ProgramBuilder::new("t");
        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(b.method("C", &format!("m{i}"), &["p"]));
        }
        for w in ids.windows(2) {
            b.call_method(w[1], w[0], vec![param(0)], None);
        }
        let root = b.method("C", "root", &[]);
        b.call_method(root, ids[5], vec![lit("MD5")], None);
        let program = b.build();

        let unbounded = ArgumentResolver::new(&program).with_max_depth(None);
        assert_eq!(unbounded.resolve(&param(0), ids[0]).value, "MD5");

        let bounded = ArgumentResolver::new(&program).with_max_depth(Some(3));
        assert!(!bounded.resolve(&param(0), ids[0]).is_resolved());
    }

    /// `width` methods per layer; every method forwards its parameter to
    /// every method of the layer below. Returns the layers, sink first.
    fn layered(b: &mut ProgramBuilder, width: usize, depth: usize) -> Vec<Vec<MethodId>> {
        let sink = b.method("L", "sink", &["p"]);
        let mut layers = vec![vec![sink]];
        for d in 0..depth {
            let layer: Vec<MethodId> = (0..width)
                .map(|w| b.method("L", &format!("m{d}_{w}"), &["p"]))
                .collect();
            let below = layers[layers.len() - 1].clone();
            for &caller in &layer {
                for &callee in &below {
                    b.call_method(caller, callee, vec![param(0)], None);
                }
            }
            layers.push(layer);
        }
        layers
    }

    #[test]
    fn wide_forwarding_graph_without_literal_terminates_quickly() {
        // 3^24 simple paths; only finishes if failed sub-searches are reused.
        let mut b = ProgramBuilder::new("t");
        let layers = layered(&mut b, 3, 24);
        let program = b.build();

        let resolver = ArgumentResolver::new(&program).with_max_depth(None);
        let resolved = resolver.resolve(&param(0), layers[0][0]);
        assert_eq!(resolved, ResolvedValue::unresolved());
    }

    #[test]
    fn wide_forwarding_graph_finds_literal_behind_failed_branches() {
        let mut b = ProgramBuilder::new("t");
        let layers = layered(&mut b, 3, 20);
        let root = b.method("L", "root", &[]);
        let top = layers[layers.len() - 1].clone();
        b.call_method(root, top[2], vec![lit("SHA1")], None);
        let program = b.build();

        let resolver = ArgumentResolver::new(&program).with_max_depth(None);
        let resolved = resolver.resolve(&param(0), layers[0][0]);
        assert_eq!(resolved.value, "SHA1");
        assert_eq!(resolved.trace.len(), 22);
        assert_eq!(resolved.trace[0], "L.root");
        assert_eq!(resolved.trace[21], "L.sink");
    }

    #[test]
    fn path_dependent_failure_is_not_reused() {
        // First path sink <- a <- x dies because x's only caller is a, which
        // is on the path. The second path sink <- x <- a reaches a through
        // its other parameter, which root grounds.
        let mut b = ProgramBuilder::new("t");
        let sink = b.method("C", "sink", &["p"]);
        let a = b.method("C", "a", &["p", "q"]);
        let x = b.method("C", "x", &["p"]);
        let root = b.method("C", "root", &[]);
        b.call_method(a, sink, vec![param(0)], None);
        b.call_method(x, sink, vec![param(0)], None);
        b.call_method(x, a, vec![param(0), param(0)], None);
        b.call_method(root, a, vec![ArgumentValue::Unsupported, lit("MD4")], None);
        b.call_method(a, x, vec![param(1)], None);
        let program = b.build();

        let resolver = ArgumentResolver::new(&program).with_max_depth(None);
        let resolved = resolver.resolve(&param(0), sink);
        assert_eq!(resolved.value, "MD4");
        assert_eq!(resolved.trace, vec!["C.root", "C.a", "C.x", "C.sink"]);
    }

    #[test]
    fn no_callers_is_unresolved() {
        let mut b = ProgramBuilder::new("t");
        let lonely = b.method("C", "lonely", &["p"]);
        let program = b.build();
        let resolved = ArgumentResolver::new(&program).resolve(&param(0), lonely);
        assert_eq!(resolved, ResolvedValue::unresolved());
    }
}
