//! Virtual-node tree model.
//!
//! One `VNodeArena` holds the nodes of one or more render passes on the same
//! side (static or dynamic) of a traversal. Nodes reference their children by
//! `VNodeId`, and the arena records parent back-references for inheritance
//! walks; parents are never used for ownership.

use compact_str::CompactString;
use gesso_palette::FxHashMap;
use serde_json::Value;
use std::rc::Rc;

use crate::LocalBoxFuture;

/// Index of a node in a [`VNodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VNodeId(u32);

impl VNodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One virtual node, as a closed sum over the node kinds a render pass can
/// produce. A node is never both a component placeholder and an async
/// placeholder; the two are distinct variants.
pub enum VNode {
    Element(ElementNode),
    Text(TextNode),
    Comment(CommentNode),
    Component(ComponentNode),
    AsyncPlaceholder(AsyncNode),
    StringNode(StringNode),
}

/// Kind discriminant for dispatching over node pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VNodeKind {
    Element,
    Text,
    Comment,
    Component,
    AsyncPlaceholder,
    StringNode,
}

impl VNode {
    pub fn kind(&self) -> VNodeKind {
        match self {
            VNode::Element(_) => VNodeKind::Element,
            VNode::Text(_) => VNodeKind::Text,
            VNode::Comment(_) => VNodeKind::Comment,
            VNode::Component(_) => VNodeKind::Component,
            VNode::AsyncPlaceholder(_) => VNodeKind::AsyncPlaceholder,
            VNode::StringNode(_) => VNodeKind::StringNode,
        }
    }

    /// Kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self.kind() {
            VNodeKind::Element => "element",
            VNodeKind::Text => "text",
            VNodeKind::Comment => "comment",
            VNodeKind::Component => "component",
            VNodeKind::AsyncPlaceholder => "async-placeholder",
            VNodeKind::StringNode => "string-node",
        }
    }
}

/// A tag element with attributes and children
pub struct ElementNode {
    pub tag: CompactString,
    pub data: VNodeData,
    pub children: Vec<VNodeId>,
}

/// A text node. `raw` text is emitted as-is (v-html output); otherwise the
/// payload is HTML-escaped at serialization time.
pub struct TextNode {
    pub text: String,
    pub raw: bool,
}

/// An HTML comment node
pub struct CommentNode {
    pub text: String,
}

/// A not-yet-instantiated component placeholder
pub struct ComponentNode {
    pub tag: CompactString,
    pub data: VNodeData,
    pub options: ComponentOptions,
}

/// An async-component placeholder awaiting factory resolution
pub struct AsyncNode {
    pub factory: AsyncFactoryHandle,
    pub meta: AsyncMeta,
}

/// An SSR-only node holding pre-rendered open/close markup plus nested
/// children.
pub struct StringNode {
    pub open: String,
    pub close: String,
    pub children: Vec<VNodeId>,
}

/// Attributes, bindings and directives attached to an element or component
/// placeholder. The diff engine treats everything here as opaque except the
/// directive list and style/show inspection.
#[derive(Default, Clone)]
pub struct VNodeData {
    /// Resolved attributes, in render order
    pub attrs: Vec<(CompactString, AttrValue)>,
    /// Fully resolved class string, if any class binding was present
    pub class: Option<String>,
    /// Resolved style entries, in render order
    pub style: Vec<(CompactString, String)>,
    /// Directives to re-resolve when rendering the starting tag
    pub directives: Vec<DirectiveBinding>,
    /// Scoped-CSS id (`data-v-xxx`)
    pub scope_id: Option<CompactString>,
    /// Scoped-slot map; opaque to the diff engine
    pub scoped_slots: FxHashMap<CompactString, Value>,
    /// v-model binding descriptor; opaque to the diff engine
    pub model: Option<Value>,
}

/// A resolved attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    /// Boolean attribute: rendered as `name="name"` when true, omitted when
    /// false.
    Bool(bool),
}

/// A directive occurrence with its already-evaluated value
#[derive(Debug, Clone)]
pub struct DirectiveBinding {
    pub name: CompactString,
    pub expression: Option<String>,
    pub value: Value,
    pub arg: Option<CompactString>,
    pub modifiers: Vec<CompactString>,
}

/// Constructor reference, resolved props, listener map and slot children for
/// a component placeholder.
pub struct ComponentOptions {
    /// Registered component name; the environment resolves it to a
    /// constructor.
    pub name: CompactString,
    /// Resolved props for the instance
    pub props: Value,
    /// Listener map; never rendered on the server, kept opaque
    pub listeners: FxHashMap<CompactString, String>,
    /// Original children from the call site, projected into slots
    pub children: Vec<VNodeId>,
}

/// Placement data an async placeholder keeps so creation can be re-attempted
/// once the factory resolves.
pub struct AsyncMeta {
    pub tag: CompactString,
    pub data: VNodeData,
    pub children: Vec<VNodeId>,
}

/// Error from an async component factory
#[derive(Debug, Clone, thiserror::Error)]
#[error("async component resolution failed: {0}")]
pub struct ResolveError(pub String);

/// Builds a functional component's output nodes into an arena
pub type NodeBuilder = Box<dyn FnOnce(&mut VNodeArena) -> Vec<VNodeId>>;

/// What an async factory resolves to
pub enum ResolvedComponent {
    /// Stateful component options, instantiated at the placeholder's
    /// position through the environment.
    Options {
        name: CompactString,
        props: Value,
    },
    /// A functional component's already-rendered output; may be multi-root.
    Nodes(NodeBuilder),
}

/// An async component's resolver. Both historical factory signatures of the
/// source framework (plain callback and `{ component: promise }`) collapse
/// into this single async method.
pub trait AsyncComponentFactory {
    fn resolve(&self) -> LocalBoxFuture<'_, Result<ResolvedComponent, ResolveError>>;
}

pub type AsyncFactoryHandle = Rc<dyn AsyncComponentFactory>;

/// Index arena owning the virtual nodes of one traversal side.
#[derive(Default)]
pub struct VNodeArena {
    nodes: Vec<VNode>,
    parents: Vec<Option<VNodeId>>,
}

impl VNodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a node. Child links must already point into this arena;
    /// their parent back-references are wired here.
    pub fn alloc(&mut self, node: VNode) -> VNodeId {
        let id = VNodeId(self.nodes.len() as u32);
        let children: Vec<VNodeId> = match &node {
            VNode::Element(el) => el.children.clone(),
            VNode::StringNode(sn) => sn.children.clone(),
            _ => Vec::new(),
        };
        self.nodes.push(node);
        self.parents.push(None);
        for child in children {
            self.parents[child.index()] = Some(id);
        }
        id
    }

    pub fn node(&self, id: VNodeId) -> &VNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: VNodeId) -> &mut VNode {
        &mut self.nodes[id.index()]
    }

    /// Weak back-reference to the node's parent within its render pass
    pub fn parent(&self, id: VNodeId) -> Option<VNodeId> {
        self.parents[id.index()]
    }

    /// Ordered children of a node; empty for leaf kinds
    pub fn children(&self, id: VNodeId) -> &[VNodeId] {
        match self.node(id) {
            VNode::Element(el) => &el.children,
            VNode::StringNode(sn) => &sn.children,
            _ => &[],
        }
    }

    pub fn alloc_element(
        &mut self,
        tag: impl Into<CompactString>,
        data: VNodeData,
        children: Vec<VNodeId>,
    ) -> VNodeId {
        self.alloc(VNode::Element(ElementNode {
            tag: tag.into(),
            data,
            children,
        }))
    }

    pub fn alloc_text(&mut self, text: impl Into<String>, raw: bool) -> VNodeId {
        self.alloc(VNode::Text(TextNode {
            text: text.into(),
            raw,
        }))
    }

    pub fn alloc_comment(&mut self, text: impl Into<String>) -> VNodeId {
        self.alloc(VNode::Comment(CommentNode { text: text.into() }))
    }

    pub fn alloc_string_node(
        &mut self,
        open: impl Into<String>,
        close: impl Into<String>,
        children: Vec<VNodeId>,
    ) -> VNodeId {
        self.alloc(VNode::StringNode(StringNode {
            open: open.into(),
            close: close.into(),
            children,
        }))
    }

    pub fn alloc_component(
        &mut self,
        tag: impl Into<CompactString>,
        data: VNodeData,
        options: ComponentOptions,
    ) -> VNodeId {
        self.alloc(VNode::Component(ComponentNode {
            tag: tag.into(),
            data,
            options,
        }))
    }

    pub fn alloc_async(&mut self, factory: AsyncFactoryHandle, meta: AsyncMeta) -> VNodeId {
        self.alloc(VNode::AsyncPlaceholder(AsyncNode { factory, meta }))
    }
}

impl std::ops::Index<VNodeId> for VNodeArena {
    type Output = VNode;

    fn index(&self, id: VNodeId) -> &VNode {
        self.node(id)
    }
}
