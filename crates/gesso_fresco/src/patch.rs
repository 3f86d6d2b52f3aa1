//! Per-kind diff procedures and the AST-shaking finalize steps.
//!
//! Every procedure compares one static node against one dynamic node and
//! writes its verdict onto the static node's facts, never onto the dynamic
//! side. A kind mismatch is the universal non-foldable fallback: the node is
//! left unmarked and the walk continues.

use compact_str::CompactString;
use gesso_maquette::ast::{helpers, ExprId, ExprKind};
use gesso_maquette::{ComponentOptions, ResolvedComponent, VNode, VNodeId, VNodeKind};
use gesso_palette::html::escape_html;
use gesso_palette::{is_void_tag, FxHashMap};
use gesso_stencil::generate;
use tracing::{trace, warn};

use crate::bridge;
use crate::context::{ChildrenFrame, ComponentFrame, Frame, PatchContext};
use crate::errors::OptimizeError;
use crate::html;
use crate::render_tree::CompiledRender;

/// One folded child position: a merged run of adjacent static literals, or a
/// dynamic child carried by its own syntax node.
enum Fold {
    Literal(String),
    Dynamic(Option<ExprId>),
}

impl PatchContext<'_> {
    pub(crate) async fn dispatch(
        &mut self,
        s: VNodeId,
        d: VNodeId,
        is_root: bool,
    ) -> Result<(), OptimizeError> {
        let static_kind = self.static_arena[s].kind();
        let dynamic_kind = self.dynamic_arena[d].kind();
        match (static_kind, dynamic_kind) {
            (VNodeKind::Element, VNodeKind::Element) => self.patch_element(s, d, is_root),
            (VNodeKind::StringNode, VNodeKind::StringNode) => self.patch_string_node(s, d),
            (VNodeKind::Text, VNodeKind::Text) => self.patch_text(s, d),
            (VNodeKind::Comment, VNodeKind::Comment) => self.patch_comment(s, d),
            (VNodeKind::Component, VNodeKind::Component) => {
                return self.patch_component(s, d).await;
            }
            (VNodeKind::AsyncPlaceholder, VNodeKind::AsyncPlaceholder) => {
                return self.patch_async(s, d).await;
            }
            (static_kind, dynamic_kind) => {
                trace!(?static_kind, ?dynamic_kind, "kind mismatch, leaving unmarked");
            }
        }
        Ok(())
    }

    fn patch_element(&mut self, s: VNodeId, d: VNodeId, is_root: bool) {
        let (s_tag, s_children) = match &self.static_arena[s] {
            VNode::Element(el) => (el.tag.clone(), el.children.clone()),
            _ => return,
        };
        let (d_tag, d_children) = match &self.dynamic_arena[d] {
            VNode::Element(el) => (el.tag.clone(), el.children.clone()),
            _ => return,
        };
        if s_tag != d_tag {
            return;
        }

        let s_start =
            self.env
                .render_starting_tag(&self.static_arena, s, self.static_active.as_ref(), is_root);
        let d_start = self.env.render_starting_tag(
            &self.dynamic_arena,
            d,
            self.dynamic_active.as_ref(),
            is_root,
        );

        if is_void_tag(&s_tag) {
            if s_start == d_start {
                self.facts.mark_static(s, s_start);
            }
            return;
        }

        let end_tag = format!("</{s_tag}>");
        if s_children.is_empty() && d_children.is_empty() {
            if s_start == d_start {
                self.facts.mark_static(s, format!("{s_start}{end_tag}"));
            }
            return;
        }

        if s_children.len() == d_children.len() && s_start == d_start {
            self.facts.get_mut(s).ssr_string = Some(s_start);
            self.bind_children(s, &s_children);
            self.stack.push(Frame::Children(ChildrenFrame {
                parent: s,
                total: s_children.len(),
                static_children: s_children,
                dynamic_children: d_children,
                rendered: 0,
                end_tag: Some(end_tag),
            }));
        }
    }

    fn patch_string_node(&mut self, s: VNodeId, d: VNodeId) {
        let (s_open, s_close, s_children) = match &self.static_arena[s] {
            VNode::StringNode(sn) => (sn.open.clone(), sn.close.clone(), sn.children.clone()),
            _ => return,
        };
        let (d_open, d_close, d_children) = match &self.dynamic_arena[d] {
            VNode::StringNode(sn) => (sn.open.clone(), sn.close.clone(), sn.children.clone()),
            _ => return,
        };

        if s_children.is_empty() && d_children.is_empty() {
            let s_markup = format!("{s_open}{s_close}");
            let d_markup = format!("{d_open}{d_close}");
            if s_markup.trim() == d_markup.trim() {
                self.facts.mark_static(s, s_markup);
            }
            return;
        }

        if s_children.len() == d_children.len() && s_open == d_open && s_close == d_close {
            self.facts.get_mut(s).ssr_string = Some(s_open);
            self.bind_children(s, &s_children);
            self.stack.push(Frame::Children(ChildrenFrame {
                parent: s,
                total: s_children.len(),
                static_children: s_children,
                dynamic_children: d_children,
                rendered: 0,
                end_tag: Some(s_close),
            }));
        }
    }

    fn patch_text(&mut self, s: VNodeId, d: VNodeId) {
        let s_text = match &self.static_arena[s] {
            VNode::Text(t) => {
                if t.raw {
                    t.text.clone()
                } else {
                    escape_html(&t.text)
                }
            }
            _ => return,
        };
        let d_text = match &self.dynamic_arena[d] {
            VNode::Text(t) => {
                if t.raw {
                    t.text.clone()
                } else {
                    escape_html(&t.text)
                }
            }
            _ => return,
        };
        if s_text == d_text {
            self.facts.mark_static(s, s_text);
        }
    }

    fn patch_comment(&mut self, s: VNodeId, d: VNodeId) {
        let s_text = match &self.static_arena[s] {
            VNode::Comment(c) => c.text.clone(),
            _ => return,
        };
        let d_text = match &self.dynamic_arena[d] {
            VNode::Comment(c) => c.text.clone(),
            _ => return,
        };
        if s_text == d_text {
            self.facts.mark_static(s, format!("<!--{s_text}-->"));
        }
    }

    async fn patch_component(&mut self, s: VNodeId, d: VNodeId) -> Result<(), OptimizeError> {
        let static_instance = {
            let VNode::Component(node) = &self.static_arena[s] else {
                return Ok(());
            };
            self.env
                .create_component_instance(node, self.static_active.as_ref())?
        };
        let dynamic_instance = {
            let VNode::Component(node) = &self.dynamic_arena[d] else {
                return Ok(());
            };
            self.env
                .create_component_instance(node, self.dynamic_active.as_ref())?
        };
        self.enter_component(Some(s), static_instance, dynamic_instance, false)
            .await
    }

    async fn patch_async(&mut self, s: VNodeId, d: VNodeId) -> Result<(), OptimizeError> {
        let (s_factory, s_tag, s_data, s_slots) = match &self.static_arena[s] {
            VNode::AsyncPlaceholder(n) => (
                n.factory.clone(),
                n.meta.tag.clone(),
                n.meta.data.clone(),
                n.meta.children.clone(),
            ),
            _ => return Ok(()),
        };
        let (d_factory, d_tag, d_data, d_slots) = match &self.dynamic_arena[d] {
            VNode::AsyncPlaceholder(n) => (
                n.factory.clone(),
                n.meta.tag.clone(),
                n.meta.data.clone(),
                n.meta.children.clone(),
            ),
            _ => return Ok(()),
        };

        let (s_resolved, d_resolved) = tokio::try_join!(s_factory.resolve(), d_factory.resolve())?;

        match (s_resolved, d_resolved) {
            (
                ResolvedComponent::Options {
                    name: s_name,
                    props: s_props,
                },
                ResolvedComponent::Options {
                    name: d_name,
                    props: d_props,
                },
            ) => {
                let new_s = self.static_arena.alloc_component(
                    s_tag,
                    s_data,
                    ComponentOptions {
                        name: s_name,
                        props: s_props,
                        listeners: FxHashMap::default(),
                        children: s_slots,
                    },
                );
                let new_d = self.dynamic_arena.alloc_component(
                    d_tag,
                    d_data,
                    ComponentOptions {
                        name: d_name,
                        props: d_props,
                        listeners: FxHashMap::default(),
                        children: d_slots,
                    },
                );
                self.alias_resolved(s, new_s);
                self.patch_node(new_s, new_d, false).await
            }
            (ResolvedComponent::Nodes(s_build), ResolvedComponent::Nodes(d_build)) => {
                let s_nodes = s_build(&mut self.static_arena);
                let d_nodes = d_build(&mut self.dynamic_arena);
                if s_nodes.len() == 1 && d_nodes.len() == 1 {
                    self.alias_resolved(s, s_nodes[0]);
                    self.patch_node(s_nodes[0], d_nodes[0], false).await
                } else if s_nodes.len() == d_nodes.len() {
                    self.stack.push(Frame::Fragment(ChildrenFrame {
                        parent: s,
                        total: s_nodes.len(),
                        static_children: s_nodes,
                        dynamic_children: d_nodes,
                        rendered: 0,
                        end_tag: None,
                    }));
                    Ok(())
                } else {
                    self.facts.mark_static(s, "<!---->".into());
                    Ok(())
                }
            }
            _ => {
                trace!("async factories resolved to different shapes, comment fallback");
                self.facts.mark_static(s, "<!---->".into());
                Ok(())
            }
        }
    }

    /// Forward the placeholder's facts slot to the resolved node, carrying
    /// the syntax binding the parent's bind pass wrote onto the placeholder.
    fn alias_resolved(&mut self, placeholder: VNodeId, resolved: VNodeId) {
        let inherited = self.facts.get(placeholder).ast;
        self.facts.alias(placeholder, resolved);
        let facts = self.facts.get_mut(resolved);
        if facts.ast.is_none() {
            facts.ast = inherited;
        }
    }

    /// Bind each static child to its element of the parent call's children
    /// array; failure marks the parent unmatched so the finalize step only
    /// annotates strings.
    fn bind_children(&mut self, parent: VNodeId, children: &[VNodeId]) {
        let parent_facts = self.facts.get(parent);
        if parent_facts.unmatched {
            return;
        }
        let Some(node_ref) = parent_facts.ast else {
            self.facts.get_mut(parent).unmatched = true;
            return;
        };
        let Some(instance) = self.static_active.clone() else {
            self.facts.get_mut(parent).unmatched = true;
            return;
        };
        let bound = bridge::bind_children(
            &mut self.facts,
            node_ref.ast,
            &self.asts[node_ref.ast.index()],
            node_ref.expr,
            children,
            &*instance,
        );
        if !bound {
            self.facts.get_mut(parent).unmatched = true;
        }
    }

    /// Element and string-node finalize: fold the children's annotations and
    /// rewrite the parent's call node.
    pub(crate) fn ast_shaking(&mut self, frame: ChildrenFrame) {
        let parent_facts = self.facts.get(frame.parent);
        let unmatched = parent_facts.unmatched;
        let parent_ref = parent_facts.ast;
        let prefix = parent_facts.ssr_string.clone();

        let folds = self.fold_children(&frame.static_children);

        if let [Fold::Literal(merged)] = folds.as_slice() {
            let (Some(prefix), Some(end_tag)) = (&prefix, &frame.end_tag) else {
                return;
            };
            let full = format!("{prefix}{merged}{end_tag}");
            if !unmatched {
                if let Some(node_ref) = parent_ref {
                    let arena = &mut self.asts[node_ref.ast.index()].arena;
                    let callee = arena.alloc_ident(helpers::CREATE_STRING_NODE);
                    let literal = arena.alloc_str(full.clone());
                    arena.replace(
                        node_ref.expr,
                        ExprKind::Call {
                            callee,
                            args: vec![literal],
                        },
                    );
                }
            }
            self.facts.mark_static(frame.parent, full);
            return;
        }

        // A mixed fold mutates the syntax tree, so an unmatched parent stays
        // annotation-only and keeps nothing.
        if unmatched {
            return;
        }
        let Some(node_ref) = parent_ref else {
            return;
        };
        let arena = &mut self.asts[node_ref.ast.index()].arena;
        let Some((array_id, _)) = bridge::children_array(arena, node_ref.expr) else {
            return;
        };
        let mut elements = Vec::with_capacity(folds.len());
        for fold in folds {
            match fold {
                Fold::Literal(text) => {
                    let literal = arena.alloc_str(text);
                    elements
                        .push(arena.alloc_call_named(helpers::CREATE_STRING_NODE, vec![literal]));
                }
                Fold::Dynamic(Some(expr)) => elements.push(expr),
                Fold::Dynamic(None) => return,
            }
        }
        arena.replace(array_id, ExprKind::Array(elements));
        bridge::reduce_string_node(arena, node_ref.expr);
    }

    /// Fragment finalize: a multi-root async resolution folds onto its
    /// placeholder only when every root proved static.
    pub(crate) fn fragment_shaking(&mut self, frame: ChildrenFrame) {
        let all_static = frame
            .static_children
            .iter()
            .all(|child| self.facts.get(*child).ssr_static);
        if !all_static {
            return;
        }
        if let Some(markup) = bridge::static_run_markup(&self.facts, &frame.static_children) {
            self.facts.mark_static(frame.parent, markup);
        }
    }

    /// Component finalize: restore the active instances, lift a fully folded
    /// literal onto the placeholder, and record the boundary's render-tree
    /// entry.
    pub(crate) fn ast_component_shaking(&mut self, frame: ComponentFrame) {
        self.static_active = frame.prev_static_active.clone();
        self.dynamic_active = frame.prev_dynamic_active.clone();

        let root_facts = self.facts.get(frame.root_vnode);
        let mut literal = if root_facts.ssr_static {
            root_facts.ssr_string.clone()
        } else {
            None
        };

        let mut failed_validation = false;
        if let Some(expected) = &literal {
            if self.options.validate_static {
                let serialized = html::render_subtree(
                    self.env,
                    &self.static_arena,
                    &self.facts,
                    frame.root_vnode,
                    Some(&frame.static_instance),
                    frame.is_root,
                );
                if serialized.as_deref() != Some(expected.as_str()) {
                    warn!(
                        folded = %expected,
                        serialized = ?serialized,
                        "folded literal failed validation, keeping original render"
                    );
                    literal = None;
                    failed_validation = true;
                }
            }
        }

        let (render, is_static, styles) = if let Some(html) = literal {
            if let Some(placeholder) = frame.placeholder {
                self.facts.mark_static(placeholder, html.clone());
            }
            (CompiledRender::Static { html }, true, frame.styles)
        } else if !frame.unmatched && !failed_validation {
            match frame.ast {
                Some(ast) => (
                    CompiledRender::Optimized {
                        source: generate(&self.asts[ast.index()]),
                    },
                    false,
                    FxHashMap::<CompactString, String>::default(),
                ),
                None => (
                    CompiledRender::Original {
                        source: frame.original_source.unwrap_or_default(),
                    },
                    false,
                    FxHashMap::default(),
                ),
            }
        } else {
            (
                CompiledRender::Original {
                    source: frame.original_source.unwrap_or_default(),
                },
                false,
                FxHashMap::default(),
            )
        };
        self.tree.finish(render, is_static, styles);
    }

    fn fold_children(&self, children: &[VNodeId]) -> Vec<Fold> {
        let mut folds: Vec<Fold> = Vec::new();
        for child in children {
            let facts = self.facts.get(*child);
            if facts.ssr_static {
                if let Some(text) = &facts.ssr_string {
                    if let Some(Fold::Literal(run)) = folds.last_mut() {
                        run.push_str(text);
                    } else {
                        folds.push(Fold::Literal(text.clone()));
                    }
                    continue;
                }
            }
            folds.push(Fold::Dynamic(facts.ast.map(|r| r.expr)));
        }
        folds
    }
}
