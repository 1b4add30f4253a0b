use serde::{Deserialize, Serialize};

use super::{CallSiteId, MethodId};

/// An edge from a calling call site into the method it invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallEdge {
    pub call_site: CallSiteId,
    pub callee: MethodId,
}

impl CallEdge {
    pub fn caller(&self) -> MethodId {
        self.call_site.method
    }
}

/// Directed multigraph of call edges, indexed by callee.
///
/// Incoming edges are kept in insertion order; that order is the edge
/// enumeration order the resolver's tie-break depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraph {
    incoming: Vec<Vec<CallEdge>>,
    edge_count: usize,
}

impl CallGraph {
    #[cfg(test)]
    pub fn with_methods(method_count: usize) -> Self {
        Self {
            incoming: vec![Vec::new(); method_count],
            edge_count: 0,
        }
    }

    /// Record that `call_site` invokes `callee`. Duplicate edges are kept.
    pub fn add_edge(&mut self, call_site: CallSiteId, callee: MethodId) {
        if callee.0 >= self.incoming.len() {
            self.incoming.resize(callee.0 + 1, Vec::new());
        }
        self.incoming[callee.0].push(CallEdge { call_site, callee });
        self.edge_count += 1;
    }

    /// Who calls `method`, in edge enumeration order.
    pub fn edges_into(&self, method: MethodId) -> &[CallEdge] {
        self.incoming
            .get(method.0)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(method: usize, index: usize) -> CallSiteId {
        CallSiteId {
            method: MethodId(method),
            index,
        }
    }

    #[test]
    fn edges_into_preserves_insertion_order() {
        let mut graph = CallGraph::with_methods(3);
        graph.add_edge(site(1, 0), MethodId(0));
        graph.add_edge(site(2, 4), MethodId(0));
        graph.add_edge(site(1, 0), MethodId(0));

        let callers: Vec<_> = graph
            .edges_into(MethodId(0))
            .iter()
            .map(|e| e.call_site)
            .collect();
        assert_eq!(callers, vec![site(1, 0), site(2, 4), site(1, 0)]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn unknown_method_has_no_edges() {
        let graph = CallGraph::with_methods(1);
        assert!(graph.edges_into(MethodId(7)).is_empty());
    }
}
