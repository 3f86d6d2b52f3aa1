//! Render-function expression AST.
//!
//! The compiled render function of a component is a small expression
//! language: helper calls, array literals, string literals, `+`
//! concatenation chains, and ternaries for conditional rendering. Nodes are
//! owned by an index arena; rewriting a node in place is a write at its
//! index, so a node reachable from two parents can never alias.

use compact_str::CompactString;

/// Render helper callee names recognized by the optimizer
pub mod helpers {
    /// Create-element helper
    pub const CREATE_ELEMENT: &str = "_c";
    /// Create-string-node helper (SSR-only pre-rendered markup)
    pub const CREATE_STRING_NODE: &str = "_ssrNode";
    /// Create-text helper
    pub const CREATE_TEXT: &str = "_v";
    /// To-string helper for interpolations
    pub const TO_STRING: &str = "_s";
    /// List-render helper (v-for)
    pub const RENDER_LIST: &str = "_l";
}

/// Index of an expression in an [`AstArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Binary operators of the render-expression grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::StrictEq => "===",
            BinOp::StrictNotEq => "!==",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

/// One expression or statement node
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Ident(CompactString),
    Member {
        object: ExprId,
        property: CompactString,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    Array(Vec<ExprId>),
    /// Object literal (element data argument); opaque to the optimizer
    Object(Vec<(CompactString, ExprId)>),
    Binary {
        op: BinOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnOp,
        expr: ExprId,
    },
    Conditional {
        test: ExprId,
        consequent: ExprId,
        alternate: ExprId,
    },
    Return(ExprId),
    Function {
        name: Option<CompactString>,
        params: Vec<CompactString>,
        body: Vec<ExprId>,
    },
}

/// Owned index arena for one render function's syntax tree.
///
/// One arena belongs to exactly one traversal; concurrent traversals each
/// parse their own fresh copy of the source.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AstArena {
    nodes: Vec<ExprKind>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alloc(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(kind);
        id
    }

    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.nodes[id.index()]
    }

    pub fn kind_mut(&mut self, id: ExprId) -> &mut ExprKind {
        &mut self.nodes[id.index()]
    }

    /// Rewrite a node in place, keeping its identity
    pub fn replace(&mut self, id: ExprId, kind: ExprKind) {
        self.nodes[id.index()] = kind;
    }

    pub fn alloc_str(&mut self, s: impl Into<String>) -> ExprId {
        self.alloc(ExprKind::Str(s.into()))
    }

    pub fn alloc_ident(&mut self, name: impl Into<CompactString>) -> ExprId {
        self.alloc(ExprKind::Ident(name.into()))
    }

    /// Allocate a call to a named helper
    pub fn alloc_call_named(
        &mut self,
        name: impl Into<CompactString>,
        args: Vec<ExprId>,
    ) -> ExprId {
        let callee = self.alloc_ident(name);
        self.alloc(ExprKind::Call { callee, args })
    }

    /// Callee name of a call node whose callee is a plain identifier
    pub fn callee_name(&self, id: ExprId) -> Option<&str> {
        if let ExprKind::Call { callee, .. } = self.kind(id) {
            if let ExprKind::Ident(name) = self.kind(*callee) {
                return Some(name.as_str());
            }
        }
        None
    }

    /// Whether a node is a call to the given helper
    pub fn is_helper_call(&self, id: ExprId, helper: &str) -> bool {
        self.callee_name(id) == Some(helper)
    }

    /// Arguments of a call node
    pub fn call_args(&self, id: ExprId) -> Option<&[ExprId]> {
        if let ExprKind::Call { args, .. } = self.kind(id) {
            Some(args)
        } else {
            None
        }
    }

    /// String payload of a string-literal node
    pub fn as_str(&self, id: ExprId) -> Option<&str> {
        if let ExprKind::Str(s) = self.kind(id) {
            Some(s)
        } else {
            None
        }
    }
}

/// A parsed render function: its arena plus the root `Function` node.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderAst {
    pub arena: AstArena,
    pub root: ExprId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_rewrites_in_place() {
        let mut arena = AstArena::new();
        let id = arena.alloc_str("a");
        arena.replace(id, ExprKind::Str("b".into()));
        assert_eq!(arena.as_str(id), Some("b"));
    }

    #[test]
    fn callee_name_requires_ident_callee() {
        let mut arena = AstArena::new();
        let call = arena.alloc_call_named("_ssrNode", vec![]);
        assert_eq!(arena.callee_name(call), Some("_ssrNode"));
        assert!(arena.is_helper_call(call, helpers::CREATE_STRING_NODE));

        let obj = arena.alloc_ident("obj");
        let member = arena.alloc(ExprKind::Member {
            object: obj,
            property: "f".into(),
        });
        let method_call = arena.alloc(ExprKind::Call {
            callee: member,
            args: vec![],
        });
        assert_eq!(arena.callee_name(method_call), None);
    }
}
