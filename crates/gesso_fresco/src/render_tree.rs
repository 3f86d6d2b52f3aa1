//! Cacheable render-tree records.
//!
//! One record per component boundary, assembled bottom-up as component frames
//! pop. The persisted convention here is always-omit: a record with no
//! remaining children serializes without a `children` key, and an empty
//! styles map serializes without a `styles` key. Consumers must not expect
//! empty arrays or maps in their place.

use compact_str::CompactString;
use gesso_palette::FxHashMap;
use serde::{Deserialize, Serialize};

/// How a component renders on cache replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CompiledRender {
    /// The whole component folded to literal markup
    Static { html: String },
    /// Rewritten render-function source with static subtrees folded into
    /// string-node literals.
    Optimized { source: String },
    /// The component's original render function, kept when folding was not
    /// possible or failed validation.
    Original { source: String },
}

/// One component boundary's compiled output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsrRenderTree {
    pub render: CompiledRender,
    /// Set only when every descendant folded into this record's literal
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<FxHashMap<CompactString, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SsrRenderTree>>,
}

/// Accumulates records along the open component frames of a traversal.
///
/// `open` must be called when a component frame is pushed and `finish` when
/// it pops; the root component's finish yields the completed tree.
#[derive(Default)]
pub struct TreeBuilder {
    stack: Vec<Vec<SsrRenderTree>>,
    completed: Option<SsrRenderTree>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin accumulating child records for a newly entered component
    pub fn open(&mut self) {
        self.stack.push(Vec::new());
    }

    /// Finalize the innermost open component into a record
    pub fn finish(
        &mut self,
        render: CompiledRender,
        is_static: bool,
        styles: FxHashMap<CompactString, String>,
    ) {
        let children = self.stack.pop().unwrap_or_default();
        let record = assemble(render, is_static, styles, children);
        match self.stack.last_mut() {
            Some(parent) => parent.push(record),
            None => self.completed = Some(record),
        }
    }

    /// The root record, once every frame has finished
    pub fn take(&mut self) -> Option<SsrRenderTree> {
        self.completed.take()
    }
}

/// Build one record, pruning a fully static child list.
///
/// When every child is static, their markup is already part of this record's
/// own output, so only their styles need replay: hoist the styles up and
/// drop the children.
fn assemble(
    render: CompiledRender,
    is_static: bool,
    mut styles: FxHashMap<CompactString, String>,
    children: Vec<SsrRenderTree>,
) -> SsrRenderTree {
    let children = if !children.is_empty() && children.iter().all(|c| c.is_static) {
        for child in children {
            if let Some(child_styles) = child.styles {
                styles.extend(child_styles);
            }
        }
        None
    } else if children.is_empty() {
        None
    } else {
        Some(children)
    };

    SsrRenderTree {
        render,
        is_static,
        styles: if styles.is_empty() { None } else { Some(styles) },
        children,
    }
}
