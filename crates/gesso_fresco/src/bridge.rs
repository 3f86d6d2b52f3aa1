//! Bridging vnodes to the syntax nodes that created them.
//!
//! The engine never carries source spans; it relies on the structural
//! correspondence between a render call's argument list and the child list it
//! produced. Conditionals are resolved against the static instance first, so
//! a child vnode always binds to the branch that actually rendered.

use gesso_maquette::ast::{helpers, AstArena, BinOp, ExprId, ExprKind, RenderAst};
use gesso_maquette::VNodeId;

use crate::eval;
use crate::facts::{AstId, AstNodeRef, FactsTable};
use crate::instance::ComponentInstance;

/// Locate the root render call of a parsed render function.
///
/// The first `return` statement's expression, with conditionals resolved, has
/// to be a create-element or string-node call for the component to take part
/// in syntax-tree rewriting at all.
pub fn find_render_call(
    ast: &RenderAst,
    instance: &dyn ComponentInstance,
) -> Option<ExprId> {
    let ExprKind::Function { body, .. } = ast.arena.kind(ast.root) else {
        return None;
    };
    let returned = body.iter().find_map(|stmt| match ast.arena.kind(*stmt) {
        ExprKind::Return(expr) => Some(*expr),
        _ => None,
    })?;
    let resolved = eval::resolve_conditionals(&ast.arena, returned, instance)?;
    let callee = ast.arena.callee_name(resolved)?;
    if callee == helpers::CREATE_ELEMENT || callee == helpers::CREATE_STRING_NODE {
        Some(resolved)
    } else {
        None
    }
}

/// The children array argument of a render call: its own node id plus its
/// elements. For `_c` the array follows an optional data object; for
/// `_ssrNode` it is the third argument.
pub fn children_array(arena: &AstArena, call: ExprId) -> Option<(ExprId, Vec<ExprId>)> {
    let args = arena.call_args(call)?;
    args.iter().find_map(|arg| match arena.kind(*arg) {
        ExprKind::Array(elements) => Some((*arg, elements.clone())),
        _ => None,
    })
}

/// Bind each static child vnode to its element of the parent call's children
/// array, resolving conditional elements against the static instance.
///
/// Returns false when the correspondence cannot be established: an element
/// count mismatch, an unevaluable conditional test, or a list-render helper
/// in the array. The caller must then mark the parent unmatched.
pub fn bind_children(
    facts: &mut FactsTable,
    ast_id: AstId,
    ast: &RenderAst,
    call: ExprId,
    static_children: &[VNodeId],
    instance: &dyn ComponentInstance,
) -> bool {
    let Some((_, elements)) = children_array(&ast.arena, call) else {
        return false;
    };
    if elements.len() != static_children.len() {
        return false;
    }
    let mut resolved = Vec::with_capacity(elements.len());
    for element in elements {
        let Some(node) = eval::resolve_conditionals(&ast.arena, element, instance) else {
            return false;
        };
        // A list render expands to an unknown number of vnodes
        if ast.arena.is_helper_call(node, helpers::RENDER_LIST) {
            return false;
        }
        resolved.push(node);
    }
    for (child, expr) in static_children.iter().zip(resolved) {
        facts.get_mut(*child).ast = Some(AstNodeRef { ast: ast_id, expr });
    }
    true
}

/// Literal payload of a fully folded string-node call, which takes exactly
/// one string argument.
pub fn string_node_literal(arena: &AstArena, id: ExprId) -> Option<String> {
    if !arena.is_helper_call(id, helpers::CREATE_STRING_NODE) {
        return None;
    }
    match arena.call_args(id) {
        Some([only]) => arena.as_str(*only).map(str::to_owned),
        _ => None,
    }
}

/// Append or prepend literal text onto a string expression chain. Chains are
/// either a string literal or `+` concatenations whose outermost edge is a
/// string literal.
pub fn merge_string_literal(
    arena: &mut AstArena,
    target: ExprId,
    text: &str,
    append: bool,
) -> bool {
    match arena.kind(target).clone() {
        ExprKind::Str(existing) => {
            let merged = if append {
                format!("{existing}{text}")
            } else {
                format!("{text}{existing}")
            };
            arena.replace(target, ExprKind::Str(merged));
            true
        }
        ExprKind::Binary {
            op: BinOp::Add,
            left,
            right,
        } => {
            let edge = if append { right } else { left };
            merge_string_literal(arena, edge, text, append)
        }
        _ => false,
    }
}

/// Flatten a pure string concatenation chain to its literal text
pub fn flatten_str(arena: &AstArena, id: ExprId) -> Option<String> {
    match arena.kind(id) {
        ExprKind::Str(s) => Some(s.clone()),
        ExprKind::Binary {
            op: BinOp::Add,
            left,
            right,
        } => {
            let mut text = flatten_str(arena, *left)?;
            text.push_str(&flatten_str(arena, *right)?);
            Some(text)
        }
        _ => None,
    }
}

/// Compact a string-node call after its children have been rewritten.
///
/// A lone fully folded child is spliced onto the end of the open chain, and
/// a string node with no remaining children and pure literal open and close
/// chains collapses to the single-argument form.
pub fn reduce_string_node(arena: &mut AstArena, call: ExprId) {
    if !arena.is_helper_call(call, helpers::CREATE_STRING_NODE) {
        return;
    }
    let Some(args) = arena.call_args(call) else {
        return;
    };
    let [open, close, array] = args else {
        return;
    };
    let (open, close, array) = (*open, *close, *array);

    let lone_literal = match arena.kind(array) {
        ExprKind::Array(elements) => match elements.as_slice() {
            [only] => string_node_literal(arena, *only),
            _ => None,
        },
        _ => return,
    };
    if let Some(literal) = lone_literal {
        if merge_string_literal(arena, open, &literal, true) {
            arena.replace(array, ExprKind::Array(Vec::new()));
        }
    }

    let emptied = matches!(arena.kind(array), ExprKind::Array(elements) if elements.is_empty());
    if emptied {
        if let (Some(mut text), Some(tail)) = (flatten_str(arena, open), flatten_str(arena, close))
        {
            text.push_str(&tail);
            let literal = arena.alloc(ExprKind::Str(text));
            let kind = ExprKind::Call {
                callee: match arena.kind(call) {
                    ExprKind::Call { callee, .. } => *callee,
                    _ => return,
                },
                args: vec![literal],
            };
            arena.replace(call, kind);
        }
    }
}

/// Concatenated literal markup of a run of static children, used when a
/// parent folds a contiguous group into one string node.
pub fn static_run_markup(facts: &FactsTable, children: &[VNodeId]) -> Option<String> {
    let mut markup = String::new();
    for child in children {
        markup.push_str(facts.get(*child).ssr_string.as_deref()?);
    }
    Some(markup)
}
