//! Intra-procedural constant propagation over statement-level bodies.
//!
//! A forward dataflow analysis that tracks, per statement, which locals are
//! known to hold a single string literal or an unmodified copy of a method
//! parameter. Join points keep a local only when every reached predecessor
//! agrees on its exact value.

use std::collections::{BTreeMap, VecDeque};

use crate::ir::body::{Body, Operand, Statement};
use crate::ir::ArgumentValue;

/// Known local values at one program point. Values are `Literal` or
/// `ParameterRef`, never `Unsupported`.
pub type Facts = BTreeMap<String, ArgumentValue>;

/// Confluence operator: keep only the bindings both sides agree on.
pub fn merge(a: &Facts, b: &Facts) -> Facts {
    a.iter()
        .filter(|(k, v)| b.get(*k) == Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Effect of one statement on the incoming facts.
pub fn transfer(statement: &Statement, input: &Facts) -> Facts {
    let mut out = input.clone();
    match statement {
        Statement::Assign { target, value } => match value {
            Operand::Literal(s) => {
                out.insert(target.clone(), ArgumentValue::Literal(s.clone()));
            }
            Operand::Parameter(i) => {
                out.insert(target.clone(), ArgumentValue::ParameterRef(*i));
            }
            Operand::Local(src) => match input.get(src) {
                Some(known) => {
                    out.insert(target.clone(), known.clone());
                }
                None => {
                    out.remove(target);
                }
            },
            Operand::Other => {
                out.remove(target);
            }
        },
        Statement::Invoke(invocation) => {
            if let Some(result) = &invocation.result {
                out.remove(result);
            }
        }
        Statement::Nop => {}
    }
    out
}

/// Fixed-point solution for one body.
#[derive(Debug, Clone)]
pub struct ConstantPropagation {
    /// Facts holding before each statement; `None` for unreachable ones.
    before: Vec<Option<Facts>>,
}

impl ConstantPropagation {
    /// Run the worklist algorithm to a fixed point. Statement 0 is the entry
    /// and starts with no known locals.
    pub fn analyze(body: &Body) -> Self {
        let n = body.statements.len();
        let preds = body.predecessors();
        let mut before: Vec<Option<Facts>> = vec![None; n];
        let mut after: Vec<Option<Facts>> = vec![None; n];
        let mut worklist: VecDeque<usize> = (0..n).collect();
        let mut queued = vec![true; n];

        while let Some(i) = worklist.pop_front() {
            queued[i] = false;

            let input = if i == 0 {
                Some(Facts::new())
            } else {
                preds[i]
                    .iter()
                    .filter_map(|p| after[*p].as_ref())
                    .fold(None, |acc: Option<Facts>, facts| match acc {
                        None => Some(facts.clone()),
                        Some(acc) => Some(merge(&acc, facts)),
                    })
            };
            let Some(input) = input else {
                continue;
            };

            let output = transfer(&body.statements[i], &input);
            before[i] = Some(input);

            if after[i].as_ref() != Some(&output) {
                after[i] = Some(output);
                for succ in body.successors_of(i) {
                    if succ < n && !queued[succ] {
                        queued[succ] = true;
                        worklist.push_back(succ);
                    }
                }
            }
        }

        Self { before }
    }

    pub fn facts_before(&self, statement: usize) -> Option<&Facts> {
        self.before.get(statement).and_then(Option::as_ref)
    }

    /// Argument shape of `operand` as evaluated just before `statement`.
    pub fn lower(&self, statement: usize, operand: &Operand) -> ArgumentValue {
        match operand {
            Operand::Literal(s) => ArgumentValue::Literal(s.clone()),
            Operand::Parameter(i) => ArgumentValue::ParameterRef(*i),
            Operand::Local(name) => self
                .facts_before(statement)
                .and_then(|facts| facts.get(name))
                .cloned()
                .unwrap_or(ArgumentValue::Unsupported),
            Operand::Other => ArgumentValue::Unsupported,
        }
    }
}
