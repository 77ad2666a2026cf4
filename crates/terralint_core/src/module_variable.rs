//! Provenance of module input variables.
//!
//! Issues found inside a child module are reported against the root-module
//! expression that fed the offending value. The graph records, for every
//! module input variable, which variables in the calling module it was
//! derived from. Root nodes are the module-call arguments written in the
//! root module itself; everything deeper is derived.
//!
//! The graph is built once while the runner tree is constructed and frozen
//! afterwards, so lookups never race with mutation.

use terralint_loader::SourceRange;

/// Index of a node in the graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

#[derive(Debug)]
struct VarNode {
    /// Range of the expression that bound this variable in the calling
    /// module's file.
    decl_range: SourceRange,
    /// Variables in the calling module this value was derived from. Empty
    /// for root nodes.
    parents: Vec<VarId>,
}

/// One path from a root declaration down to the variable a lookup started
/// from.
#[derive(Debug, Clone, PartialEq)]
pub struct RootPath {
    pub root: VarId,
    /// Declaration ranges from the root binding down to the origin variable,
    /// in call order.
    pub callers: Vec<SourceRange>,
}

#[derive(Debug, Default)]
pub struct VariableGraph {
    nodes: Vec<VarNode>,
}

impl VariableGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_root(&mut self, decl_range: SourceRange) -> VarId {
        self.push(decl_range, Vec::new())
    }

    pub fn push_derived(&mut self, decl_range: SourceRange, parents: Vec<VarId>) -> VarId {
        self.push(decl_range, parents)
    }

    fn push(&mut self, decl_range: SourceRange, parents: Vec<VarId>) -> VarId {
        let id = VarId(self.nodes.len());
        self.nodes.push(VarNode {
            decl_range,
            parents,
        });
        id
    }

    pub fn decl_range(&self, id: VarId) -> &SourceRange {
        &self.nodes[id.0].decl_range
    }

    /// All root bindings this variable was derived from, each with its
    /// caller chain. Diamond-shaped derivations yield the root once, via the
    /// first path found.
    pub fn roots(&self, id: VarId) -> Vec<RootPath> {
        let mut paths = Vec::new();
        let mut seen_roots = Vec::new();
        let mut chain = Vec::new();
        self.collect(id, &mut chain, &mut seen_roots, &mut paths, 0);
        paths
    }

    fn collect(
        &self,
        id: VarId,
        chain: &mut Vec<VarId>,
        seen_roots: &mut Vec<VarId>,
        paths: &mut Vec<RootPath>,
        depth: usize,
    ) {
        // The builder only ever links a node to previously created parents,
        // so the graph is acyclic; the guard catches builder bugs.
        debug_assert!(depth <= self.nodes.len(), "variable graph has a cycle");
        if depth > self.nodes.len() {
            return;
        }

        chain.push(id);
        let node = &self.nodes[id.0];
        if node.parents.is_empty() {
            if !seen_roots.contains(&id) {
                seen_roots.push(id);
                paths.push(RootPath {
                    root: id,
                    callers: chain
                        .iter()
                        .rev()
                        .map(|member| self.nodes[member.0].decl_range.clone())
                        .collect(),
                });
            }
        } else {
            for parent in &node.parents {
                self.collect(*parent, chain, seen_roots, paths, depth + 1);
            }
        }
        chain.pop();
    }
}
