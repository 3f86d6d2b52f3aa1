//! # Gesso
//!
//! An SSR optimizer for component-based UI frameworks: render a component
//! tree twice — once as a cache-warm "static" probe, once with real request
//! data — diff the two virtual-node trees, and rewrite the render function's
//! syntax tree so invariant subtrees become pre-computed string literals,
//! cached per route.
//!
//! This crate re-exports the Gesso sub-crates and adds the outward-facing
//! pieces: the default DOM render environment and the route cache.
//!
//! ## Crates
//!
//! - [`palette`] - Shared toolbox: HTML escaping, DOM tag tables
//! - [`maquette`] - The two tree models: VNode arena and expression AST arena
//! - [`stencil`] - Render-function source parser and code generator
//! - [`fresco`] - The diffing-and-AST-rewriting engine
//!
//! ## Name Origin
//!
//! **Gesso** is the white primer coat painted onto a canvas before any
//! artwork: a prepared, unchanging base layer the actual painting goes over.
//! The optimizer's output is exactly that — the static HTML base coat laid
//! down once per route, with the dynamic paint applied per request.

pub mod cache;
pub mod env;

/// Shared toolbox: HTML escaping, DOM tag tables.
pub use gesso_palette as palette;

/// The two tree models: VNode arena and expression AST arena.
pub use gesso_maquette as maquette;

/// Render-function source parser and code generator.
pub use gesso_stencil as stencil;

/// The diffing-and-AST-rewriting engine.
pub use gesso_fresco as fresco;

pub use cache::RouteCache;
pub use env::{ComponentRegistry, DomEnvironment};
pub use gesso_fresco::{
    optimize, CompiledRender, ComponentInstance, DirectiveRenderer, InstanceHandle,
    OptimizeError, OptimizeOptions, RenderEnvironment, SsrRenderTree,
};
