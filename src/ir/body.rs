//! Statement-level method bodies, as delivered by a program-model provider
//! before lowering.
//!
//! Bodies reference local variables; lowering runs constant propagation over
//! them and produces the call-site `ArgumentValue`s the engine consumes.

use serde::{Deserialize, Serialize};

/// A method body: statements plus optional explicit control flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Body {
    pub statements: Vec<Statement>,
    /// Successor statement indices per statement. Absent means straight-line
    /// flow (`i -> i + 1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successors: Option<Vec<Vec<usize>>>,
}

impl Body {
    /// Successors of statement `index`, falling back to straight-line flow.
    pub fn successors_of(&self, index: usize) -> Vec<usize> {
        match &self.successors {
            Some(succ) => succ.get(index).cloned().unwrap_or_default(),
            None if index + 1 < self.statements.len() => vec![index + 1],
            None => Vec::new(),
        }
    }

    /// Predecessor lists for every statement.
    pub fn predecessors(&self) -> Vec<Vec<usize>> {
        let mut preds = vec![Vec::new(); self.statements.len()];
        for from in 0..self.statements.len() {
            for to in self.successors_of(from) {
                if let Some(p) = preds.get_mut(to) {
                    p.push(from);
                }
            }
        }
        preds
    }

    /// Statement indices of every invocation, in body order.
    pub fn invocations(&self) -> impl Iterator<Item = (usize, &Invocation)> {
        self.statements
            .iter()
            .enumerate()
            .filter_map(|(i, stmt)| match stmt {
                Statement::Invoke(inv) => Some((i, inv)),
                Statement::Assign { .. } | Statement::Nop => None,
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    /// `target = value`
    Assign { target: String, value: Operand },
    /// A method invocation, optionally storing its result in a local.
    Invoke(Invocation),
    /// Anything without dataflow effect (branches, returns, ...).
    Nop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub declaring_type: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Operand>,
    /// Local receiving the call result, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Qualified names (`Class.method`) of in-program dispatch targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callees: Option<Vec<String>>,
}

/// An expression operand inside a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Literal(String),
    Parameter(usize),
    Local(String),
    Other,
}
