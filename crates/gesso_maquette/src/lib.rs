//! Maquette - The tree models for Gesso.
//!
//! This crate defines the two tree shapes the optimizer keeps in
//! correspondence during a traversal:
//!
//! - **VNode arena**: the virtual-node tree one render pass produces, as a
//!   closed sum type over element / text / comment / component placeholder /
//!   async placeholder / string node, stored in an index arena.
//! - **Expression AST arena**: the parsed render-function source, stored in
//!   an owned index arena so "rewrite this node in place" is a plain write
//!   at an index with no pointer aliasing.
//!
//! ## Name Origin
//!
//! A **maquette** is the sculptor's small preliminary model, built to study
//! the final work before committing to stone. Both trees here are exactly
//! that: models of the HTML output studied before the final string is cast.

pub mod ast;
pub mod vnode;

pub use ast::{AstArena, BinOp, ExprId, ExprKind, RenderAst, UnOp};
pub use vnode::{
    AsyncComponentFactory, AsyncFactoryHandle, AsyncMeta, AttrValue, ComponentNode,
    ComponentOptions, DirectiveBinding, ElementNode, NodeBuilder, ResolveError,
    ResolvedComponent, StringNode, VNode, VNodeArena, VNodeData, VNodeId, VNodeKind,
};

/// A boxed, non-`Send` future. The optimizer's scheduling model is
/// single-threaded and cooperative, so collaborator futures never cross
/// threads.
pub type LocalBoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + 'a>>;
