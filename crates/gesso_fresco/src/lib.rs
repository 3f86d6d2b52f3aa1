//! Fresco - The diffing and AST-rewriting engine of Gesso.
//!
//! Given two live component instances — a "static" probe rendered with no
//! request data and a "dynamic" one rendered with real data — the engine
//! walks both virtual-node trees in lockstep on an explicit continuation
//! stack, decides per node whether the output is invariant, and rewrites the
//! static render function's parsed source so invariant subtrees become string
//! literals. The result is a nested, cacheable render tree with one record
//! per component boundary.
//!
//! Structural differences between the two renders are never errors; they
//! only shrink what gets folded. Errors are reserved for thrown renders,
//! rejected prefetch hooks, failed async resolution and a broken root render
//! function.
//!
//! ## Name Origin
//!
//! A **fresco** is painted onto wet plaster, and whatever is set when the
//! plaster dries is permanent. The engine decides, once per route, which
//! parts of the markup dry into the wall and which stay repaintable per
//! request.

pub mod bridge;
pub mod context;
pub mod errors;
pub mod eval;
pub mod facts;
pub mod html;
pub mod instance;
pub mod options;
pub mod patch;
pub mod render_tree;

pub use context::optimize;
pub use errors::OptimizeError;
pub use facts::{AstId, AstNodeRef, FactsTable, NodeFacts};
pub use instance::{ComponentInstance, DirectiveRenderer, InstanceHandle, RenderEnvironment};
pub use options::OptimizeOptions;
pub use render_tree::{CompiledRender, SsrRenderTree};
