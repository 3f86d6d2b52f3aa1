//! Per-node annotations for the static tree.
//!
//! The source framework attached an `ast` side-channel field directly onto
//! each virtual node. Here the annotations live in a dense side table keyed
//! by the static arena's node ids, so the VNode type stays reusable by the
//! render pipeline without knowing about the optimizer.
//!
//! Only static-side nodes are ever annotated; the dynamic tree is read-only.

use gesso_maquette::{ExprId, VNodeId};
use gesso_palette::FxHashMap;

/// Index of one component's render AST within a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstId(pub(crate) u32);

impl AstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Reference to a node of one component's render AST
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstNodeRef {
    pub ast: AstId,
    pub expr: ExprId,
}

/// Annotations accumulated for one static virtual node
#[derive(Debug, Clone, Default)]
pub struct NodeFacts {
    /// The syntax-tree call node that constructed this vnode, when located
    pub ast: Option<AstNodeRef>,
    /// Resolved literal markup for a fully-or-partially static node
    pub ssr_string: Option<String>,
    /// True only if this node and all its descendants are static
    pub ssr_static: bool,
    /// No corresponding call node could be located; annotate strings only,
    /// never splice.
    pub unmatched: bool,
}

/// Dense table of [`NodeFacts`] keyed by static-tree [`VNodeId`].
///
/// An async placeholder that resolves gets an alias from the placeholder id
/// to the resolved node's id, so a parent folding over its original child
/// list observes the resolution's facts.
#[derive(Default)]
pub struct FactsTable {
    facts: Vec<NodeFacts>,
    aliases: FxHashMap<VNodeId, VNodeId>,
}

const EMPTY: NodeFacts = NodeFacts {
    ast: None,
    ssr_string: None,
    ssr_static: false,
    unmatched: false,
};

impl FactsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow placeholder aliases to the node currently standing in
    pub fn resolve(&self, mut id: VNodeId) -> VNodeId {
        while let Some(&target) = self.aliases.get(&id) {
            id = target;
        }
        id
    }

    /// Redirect `from` to `to` for all subsequent fact reads and writes
    pub fn alias(&mut self, from: VNodeId, to: VNodeId) {
        self.aliases.insert(from, to);
    }

    pub fn get(&self, id: VNodeId) -> &NodeFacts {
        let id = self.resolve(id);
        self.facts.get(id.index()).unwrap_or(&EMPTY)
    }

    pub fn get_mut(&mut self, id: VNodeId) -> &mut NodeFacts {
        let id = self.resolve(id);
        if self.facts.len() <= id.index() {
            self.facts.resize_with(id.index() + 1, NodeFacts::default);
        }
        &mut self.facts[id.index()]
    }

    /// Mark a node fully static with the given literal markup
    pub fn mark_static(&mut self, id: VNodeId, markup: String) {
        let facts = self.get_mut(id);
        facts.ssr_string = Some(markup);
        facts.ssr_static = true;
    }
}
