//! Program model the analysis operates on.
//!
//! Providers (see `adapter`) produce a `Program`: classes, methods, lowered
//! call sites and a call graph. The engine only ever reads it.

pub mod body;
pub mod call_graph;
pub mod call_site;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use call_graph::{CallEdge, CallGraph};
pub use call_site::{ArgumentValue, CallSite, CallSiteId};

/// Index of a method within its `Program`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(pub usize);

/// Whole-program view: classes in scope, their methods, and the call graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    /// Human-readable name of the scanned program.
    pub name: String,
    /// Classes in deterministic iteration order.
    pub classes: Vec<ClassDef>,
    methods: Vec<Method>,
    call_graph: CallGraph,
}

impl Program {
    pub fn method(&self, id: MethodId) -> Option<&Method> {
        self.methods.get(id.0)
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    pub fn call_site(&self, id: CallSiteId) -> Option<&CallSite> {
        self.method(id.method)?.body.as_ref()?.get(id.index)
    }

    /// Methods in class order, then declaration order within the class.
    pub fn methods_in_order(&self) -> impl Iterator<Item = &Method> {
        self.classes
            .iter()
            .flat_map(|c| c.methods.iter())
            .filter_map(|id| self.method(*id))
    }

    /// Methods whose qualified name is `Class.method`.
    #[cfg(test)]
    pub fn find_methods<'a>(&'a self, qualified_name: &'a str) -> impl Iterator<Item = &'a Method> {
        self.methods
            .iter()
            .filter(move |m| m.qualified_name == qualified_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub source_file: Option<PathBuf>,
    pub methods: Vec<MethodId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub id: MethodId,
    /// `Class.method`
    pub qualified_name: String,
    pub class_name: String,
    pub name: String,
    /// Sub-signature, e.g. `void digest(java.lang.String)`.
    pub signature: String,
    pub parameters: Vec<String>,
    pub is_concrete: bool,
    /// Call sites in body order. `None` when the body is unavailable.
    pub body: Option<Vec<CallSite>>,
}

impl Method {
    /// Call sites if this method can be analyzed at all.
    pub fn analyzable_body(&self) -> Option<&[CallSite]> {
        if !self.is_concrete {
            return None;
        }
        self.body.as_deref()
    }
}

/// Location in source code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Option<PathBuf>,
    pub line: u32,
}

/// Incremental construction of a `Program`.
///
/// Used by the providers and by tests that need hand-built call graphs.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            program: Program {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    fn class_index(&mut self, class_name: &str) -> usize {
        if let Some(i) = self.program.classes.iter().position(|c| c.name == class_name) {
            return i;
        }
        self.program.classes.push(ClassDef {
            name: class_name.to_string(),
            source_file: None,
            methods: Vec::new(),
        });
        self.program.classes.len() - 1
    }

    /// Declare a class up front so it keeps its position and source file.
    pub fn class(&mut self, class_name: &str, source_file: Option<PathBuf>) {
        let idx = self.class_index(class_name);
        if source_file.is_some() {
            self.program.classes[idx].source_file = source_file;
        }
    }

    /// Add a concrete method with an (initially empty) body.
    pub fn method(&mut self, class_name: &str, name: &str, parameters: &[&str]) -> MethodId {
        let params: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
        self.add_method(class_name, name, None, params, true, Some(Vec::new()))
    }

    /// Add a method whose body is unavailable.
    pub fn bodiless_method(&mut self, class_name: &str, name: &str, parameters: &[&str]) -> MethodId {
        let params: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
        self.add_method(class_name, name, None, params, false, None)
    }

    pub fn add_method(
        &mut self,
        class_name: &str,
        name: &str,
        signature: Option<String>,
        parameters: Vec<String>,
        is_concrete: bool,
        body: Option<Vec<CallSite>>,
    ) -> MethodId {
        let class_idx = self.class_index(class_name);
        let id = MethodId(self.program.methods.len());
        let signature = signature.unwrap_or_else(|| format!("{}({})", name, parameters.join(", ")));
        self.program.methods.push(Method {
            id,
            qualified_name: format!("{class_name}.{name}"),
            class_name: class_name.to_string(),
            name: name.to_string(),
            signature,
            parameters,
            is_concrete,
            body,
        });
        self.program.classes[class_idx].methods.push(id);
        id
    }

    /// Append a call site to `caller`'s body. Bodiless callers get a body.
    pub fn call(
        &mut self,
        caller: MethodId,
        declaring_type: &str,
        method_name: &str,
        arguments: Vec<ArgumentValue>,
        line: Option<u32>,
    ) -> CallSiteId {
        let file = self
            .program
            .methods
            .get(caller.0)
            .and_then(|m| self.program.classes.iter().find(|c| c.name == m.class_name))
            .and_then(|c| c.source_file.clone());
        let method = &mut self.program.methods[caller.0];
        let body = method.body.get_or_insert_with(Vec::new);
        let index = body.len();
        body.push(CallSite {
            caller,
            index,
            declaring_type: declaring_type.to_string(),
            method_name: method_name.to_string(),
            arguments,
            location: line.map(|line| SourceLocation { file, line }),
        });
        CallSiteId {
            method: caller,
            index,
        }
    }

    /// Append a call from `caller` to the in-program method `callee` and
    /// record the call-graph edge.
    pub fn call_method(
        &mut self,
        caller: MethodId,
        callee: MethodId,
        arguments: Vec<ArgumentValue>,
        line: Option<u32>,
    ) -> CallSiteId {
        let (class_name, name) = {
            let m = &self.program.methods[callee.0];
            (m.class_name.clone(), m.name.clone())
        };
        let site = self.call(caller, &class_name, &name, arguments, line);
        self.edge(site, callee);
        site
    }

    pub fn edge(&mut self, call_site: CallSiteId, callee: MethodId) {
        self.program.call_graph.add_edge(call_site, callee);
    }

    pub fn methods(&self) -> &[Method] {
        &self.program.methods
    }

    pub fn build(self) -> Program {
        self.program
    }
}
