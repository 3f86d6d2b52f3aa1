//! Collaborator seams: component instances and the render environment.
//!
//! The optimizer never renders markup itself and never instantiates
//! components itself; both concerns belong to the surrounding render
//! pipeline and reach the engine through these traits.

use compact_str::CompactString;
use gesso_maquette::{
    ComponentNode, DirectiveBinding, LocalBoxFuture, VNodeArena, VNodeId,
};
use gesso_palette::FxHashMap;
use serde_json::Value;
use std::rc::Rc;

use crate::errors::OptimizeError;

/// A live component instance on one side (static or dynamic) of the
/// traversal. Each instance is used by exactly one traversal at a time.
pub trait ComponentInstance {
    /// Produce one render pass's virtual-node tree into the arena
    fn render(&self, arena: &mut VNodeArena) -> Result<VNodeId, OptimizeError>;

    /// Source text of the compiled render function, when one exists
    fn render_source(&self) -> Option<&str>;

    /// Start and join all serverPrefetch hooks of this instance
    fn server_prefetch(&self) -> LocalBoxFuture<'_, Result<(), OptimizeError>> {
        Box::pin(async { Ok(()) })
    }

    /// Property lookup against the instance's current state; used to
    /// evaluate conditional tests and directive values.
    fn get(&self, path: &str) -> Option<Value>;

    /// Inline styles captured for this component, keyed by style id
    fn styles(&self) -> FxHashMap<CompactString, String> {
        FxHashMap::default()
    }
}

pub type InstanceHandle = Rc<dyn ComponentInstance>;

/// A runtime directive looked up by name (the `resolveAsset` seam)
pub trait DirectiveRenderer {
    /// Attribute markup this directive contributes to a starting tag,
    /// including its leading space, or None.
    fn render(&self, binding: &DirectiveBinding) -> Option<String>;
}

/// The surrounding render pipeline, as seen by the diff engine
pub trait RenderEnvironment {
    /// Instantiate a component placeholder, applying inline-template render
    /// overrides when present.
    fn create_component_instance(
        &self,
        node: &ComponentNode,
        parent: Option<&InstanceHandle>,
    ) -> Result<InstanceHandle, OptimizeError>;

    /// Ensure the instance holds a compiled render function, compiling its
    /// template if needed.
    fn normalize_render(&self, _instance: &InstanceHandle) -> Result<(), OptimizeError> {
        Ok(())
    }

    /// Opening-tag markup for an element node, with attributes, class,
    /// style, scope id and directives resolved. `is_root` marks the
    /// document root, which carries the server-rendered marker attribute.
    fn render_starting_tag(
        &self,
        arena: &VNodeArena,
        node: VNodeId,
        active: Option<&InstanceHandle>,
        is_root: bool,
    ) -> String;

    /// Look up a runtime directive implementation by name
    fn resolve_directive(&self, _name: &str) -> Option<&dyn DirectiveRenderer> {
        None
    }
}
