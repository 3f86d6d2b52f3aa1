//! Default DOM render environment.
//!
//! Renders opening-tag markup for element nodes (attributes, class, style,
//! scope id, directives) and delegates component instantiation to a
//! registry supplied by the embedding framework. The `show` directive is
//! built in; other directives render through the custom-directive registry.

use compact_str::CompactString;
use gesso_fresco::eval::is_truthy;
use gesso_fresco::{DirectiveRenderer, InstanceHandle, OptimizeError, RenderEnvironment};
use gesso_maquette::{AttrValue, ComponentNode, ElementNode, VNode, VNodeArena, VNodeId};
use gesso_palette::html::escape_html_attr;
use gesso_palette::{is_boolean_attr, FxHashMap};

/// Resolves a component placeholder to a live instance. Implemented by the
/// embedding framework's component table.
pub trait ComponentRegistry {
    fn instantiate(
        &self,
        node: &ComponentNode,
        parent: Option<&InstanceHandle>,
    ) -> Result<InstanceHandle, OptimizeError>;
}

/// A [`RenderEnvironment`] over a component registry and a custom-directive
/// table.
pub struct DomEnvironment<R> {
    registry: R,
    directives: FxHashMap<CompactString, Box<dyn DirectiveRenderer>>,
}

impl<R> DomEnvironment<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            directives: FxHashMap::default(),
        }
    }

    /// Register a custom directive renderer under its unprefixed name
    pub fn register_directive(
        &mut self,
        name: impl Into<CompactString>,
        renderer: Box<dyn DirectiveRenderer>,
    ) {
        self.directives.insert(name.into(), renderer);
    }
}

impl<R: ComponentRegistry> RenderEnvironment for DomEnvironment<R> {
    fn create_component_instance(
        &self,
        node: &ComponentNode,
        parent: Option<&InstanceHandle>,
    ) -> Result<InstanceHandle, OptimizeError> {
        self.registry.instantiate(node, parent)
    }

    fn render_starting_tag(
        &self,
        arena: &VNodeArena,
        node: VNodeId,
        _active: Option<&InstanceHandle>,
        is_root: bool,
    ) -> String {
        let VNode::Element(el) = &arena[node] else {
            return String::new();
        };
        let mut tag = format!("<{}", el.tag);
        if is_root {
            tag.push_str(" data-server-rendered=\"true\"");
        }
        render_attrs(el, &mut tag);
        if let Some(class) = &el.data.class {
            tag.push_str(&format!(" class=\"{}\"", escape_html_attr(class)));
        }
        render_style(el, &mut tag);
        if let Some(scope) = &el.data.scope_id {
            tag.push(' ');
            tag.push_str(scope);
        }
        for binding in &el.data.directives {
            if binding.name == "show" {
                continue;
            }
            if let Some(renderer) = self.resolve_directive(&binding.name) {
                if let Some(markup) = renderer.render(binding) {
                    tag.push_str(&markup);
                }
            }
        }
        tag.push('>');
        tag
    }

    fn resolve_directive(&self, name: &str) -> Option<&dyn DirectiveRenderer> {
        self.directives.get(name).map(|renderer| &**renderer)
    }
}

fn render_attrs(el: &ElementNode, tag: &mut String) {
    for (name, value) in &el.data.attrs {
        match value {
            AttrValue::Text(text) => {
                if is_boolean_attr(name) {
                    tag.push_str(&format!(" {name}=\"{name}\""));
                } else {
                    tag.push_str(&format!(" {name}=\"{}\"", escape_html_attr(text)));
                }
            }
            AttrValue::Bool(true) => tag.push_str(&format!(" {name}=\"{name}\"")),
            AttrValue::Bool(false) => {}
        }
    }
}

/// Inline style, with a falsy `show` directive folded in as `display:none`
fn render_style(el: &ElementNode, tag: &mut String) {
    let hidden = el
        .data
        .directives
        .iter()
        .any(|binding| binding.name == "show" && !is_truthy(&binding.value));
    if el.data.style.is_empty() && !hidden {
        return;
    }
    let mut style = String::new();
    for (key, value) in &el.data.style {
        style.push_str(&format!("{key}:{value};"));
    }
    if hidden {
        style.push_str("display:none;");
    }
    tag.push_str(&format!(" style=\"{}\"", escape_html_attr(&style)));
}
