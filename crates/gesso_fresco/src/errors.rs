//! Optimizer errors.
//!
//! Only truly exceptional conditions surface here: thrown renders, rejected
//! prefetch hooks, failed async resolution. "This subtree isn't foldable" is
//! never an error; it is encoded as the absence of a static annotation.

use gesso_maquette::ResolveError;
use thiserror::Error;

/// Errors that abort a whole optimization traversal
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// A component's render function failed
    #[error("render failed: {0}")]
    Render(String),

    /// A serverPrefetch hook rejected
    #[error("server prefetch failed: {0}")]
    Prefetch(String),

    /// An async component factory rejected
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The environment could not create a component instance
    #[error("component instantiation failed: {0}")]
    Instantiate(String),

    /// The root instance's render function was missing or unparseable.
    /// Non-root components degrade to the unmatched path instead.
    #[error("root render function: {0}")]
    RootRender(String),
}
