//! Traversal state and the continuation-stack drive loop.
//!
//! The engine never recurses over children; it keeps an explicit stack of
//! pending frames so the walk can suspend at component and async-component
//! boundaries while prefetch hooks and factory resolutions settle. Direct
//! recursion happens only along a chain of component roots, which is bounded
//! by component nesting depth.

use compact_str::CompactString;
use gesso_maquette::{LocalBoxFuture, RenderAst, VNodeArena, VNodeId};
use gesso_palette::FxHashMap;
use gesso_stencil::parse_render_fn;
use tracing::debug;

use crate::bridge;
use crate::errors::OptimizeError;
use crate::facts::{AstId, AstNodeRef, FactsTable};
use crate::instance::{InstanceHandle, RenderEnvironment};
use crate::options::OptimizeOptions;
use crate::render_tree::{SsrRenderTree, TreeBuilder};

/// Pending work for one node's children, compared left-to-right and
/// index-synchronized between the two sides.
pub(crate) struct ChildrenFrame {
    /// Static-side parent whose annotations the finalize step writes
    pub(crate) parent: VNodeId,
    pub(crate) static_children: Vec<VNodeId>,
    pub(crate) dynamic_children: Vec<VNodeId>,
    pub(crate) rendered: usize,
    pub(crate) total: usize,
    /// Closing markup of the parent, absent for fragments
    pub(crate) end_tag: Option<String>,
}

/// An entered component boundary, restored and finalized when popped
pub(crate) struct ComponentFrame {
    /// The placeholder vnode in the parent tree; absent at the root
    pub(crate) placeholder: Option<VNodeId>,
    pub(crate) root_vnode: VNodeId,
    pub(crate) ast: Option<AstId>,
    pub(crate) unmatched: bool,
    pub(crate) original_source: Option<String>,
    pub(crate) styles: FxHashMap<CompactString, String>,
    pub(crate) static_instance: InstanceHandle,
    pub(crate) prev_static_active: Option<InstanceHandle>,
    pub(crate) prev_dynamic_active: Option<InstanceHandle>,
    pub(crate) is_root: bool,
}

pub(crate) enum Frame {
    Children(ChildrenFrame),
    Component(ComponentFrame),
    /// Multi-root async resolution; like children but with no end tag
    Fragment(ChildrenFrame),
}

/// Shared state of one optimization traversal
pub struct PatchContext<'a> {
    pub(crate) env: &'a dyn RenderEnvironment,
    pub(crate) options: OptimizeOptions,
    pub(crate) static_arena: VNodeArena,
    pub(crate) dynamic_arena: VNodeArena,
    pub(crate) facts: FactsTable,
    /// One freshly parsed render AST per entered component
    pub(crate) asts: Vec<RenderAst>,
    pub(crate) stack: Vec<Frame>,
    pub(crate) tree: TreeBuilder,
    pub(crate) static_active: Option<InstanceHandle>,
    pub(crate) dynamic_active: Option<InstanceHandle>,
}

enum Step {
    Pair(VNodeId, VNodeId),
    Pop,
}

impl<'a> PatchContext<'a> {
    pub(crate) fn new(env: &'a dyn RenderEnvironment, options: OptimizeOptions) -> Self {
        Self {
            env,
            options,
            static_arena: VNodeArena::new(),
            dynamic_arena: VNodeArena::new(),
            facts: FactsTable::new(),
            asts: Vec::new(),
            stack: Vec::new(),
            tree: TreeBuilder::new(),
            static_active: None,
            dynamic_active: None,
        }
    }

    /// Run frames until the stack empties
    pub(crate) async fn drive(&mut self) -> Result<(), OptimizeError> {
        loop {
            let step = match self.stack.last_mut() {
                None => return Ok(()),
                Some(Frame::Children(frame) | Frame::Fragment(frame)) => {
                    if frame.rendered < frame.total {
                        let index = frame.rendered;
                        frame.rendered += 1;
                        Step::Pair(
                            frame.static_children[index],
                            frame.dynamic_children[index],
                        )
                    } else {
                        Step::Pop
                    }
                }
                Some(Frame::Component(_)) => Step::Pop,
            };
            match step {
                Step::Pair(s, d) => self.patch_node(s, d, false).await?,
                Step::Pop => {
                    let Some(frame) = self.stack.pop() else {
                        return Ok(());
                    };
                    match frame {
                        Frame::Children(frame) => self.ast_shaking(frame),
                        Frame::Fragment(frame) => self.fragment_shaking(frame),
                        Frame::Component(frame) => self.ast_component_shaking(frame),
                    }
                }
            }
        }
    }

    /// Enter a component boundary: normalize and prefetch both instances
    /// together, parse the static render source, render both roots, and push
    /// the frame before diving into the root pair.
    pub(crate) async fn enter_component(
        &mut self,
        placeholder: Option<VNodeId>,
        static_instance: InstanceHandle,
        dynamic_instance: InstanceHandle,
        is_root: bool,
    ) -> Result<(), OptimizeError> {
        self.env.normalize_render(&static_instance)?;
        self.env.normalize_render(&dynamic_instance)?;
        tokio::try_join!(
            static_instance.server_prefetch(),
            dynamic_instance.server_prefetch(),
        )?;

        let source = static_instance.render_source().map(str::to_owned);
        let mut unmatched = false;
        let mut ast_id = None;
        let mut root_call = None;
        match source.as_deref().map(parse_render_fn) {
            Some(Ok(ast)) => match bridge::find_render_call(&ast, &*static_instance) {
                Some(call) => {
                    let id = AstId(self.asts.len() as u32);
                    self.asts.push(ast);
                    ast_id = Some(id);
                    root_call = Some(call);
                }
                None => {
                    debug!("render function has no recognizable root call, unmatched");
                    unmatched = true;
                }
            },
            Some(Err(err)) => {
                if is_root {
                    return Err(OptimizeError::RootRender(err.to_string()));
                }
                debug!(error = %err, "render source did not parse, unmatched");
                unmatched = true;
            }
            None => {
                if is_root {
                    return Err(OptimizeError::RootRender(
                        "missing render function source".into(),
                    ));
                }
                unmatched = true;
            }
        }

        let static_root = static_instance.render(&mut self.static_arena)?;
        let dynamic_root = dynamic_instance.render(&mut self.dynamic_arena)?;

        if let (Some(ast), Some(expr)) = (ast_id, root_call) {
            self.facts.get_mut(static_root).ast = Some(AstNodeRef { ast, expr });
        }
        if unmatched {
            self.facts.get_mut(static_root).unmatched = true;
        }

        let styles = static_instance.styles();
        self.tree.open();
        let prev_static_active = self.static_active.replace(static_instance.clone());
        let prev_dynamic_active = self.dynamic_active.replace(dynamic_instance);
        self.stack.push(Frame::Component(ComponentFrame {
            placeholder,
            root_vnode: static_root,
            ast: ast_id,
            unmatched,
            original_source: source,
            styles,
            static_instance,
            prev_static_active,
            prev_dynamic_active,
            is_root,
        }));

        self.patch_node(static_root, dynamic_root, is_root).await
    }

    /// Boxed recursion point for node dispatch; the continuation stack
    /// carries sibling work, so this only nests along component root chains.
    pub(crate) fn patch_node(
        &mut self,
        s: VNodeId,
        d: VNodeId,
        is_root: bool,
    ) -> LocalBoxFuture<'_, Result<(), OptimizeError>> {
        Box::pin(async move { self.dispatch(s, d, is_root).await })
    }
}

/// Compare the static and dynamic renders of a component pair and emit the
/// cacheable render tree for the boundary.
///
/// The static instance's render function source is parsed and rewritten so
/// subtrees proven invariant become string literals. Structural mismatches
/// are never errors; only thrown renders, rejected prefetch hooks, failed
/// async resolution and a broken root render function surface as `Err`.
pub async fn optimize(
    env: &dyn RenderEnvironment,
    static_instance: InstanceHandle,
    dynamic_instance: InstanceHandle,
    options: OptimizeOptions,
) -> Result<SsrRenderTree, OptimizeError> {
    let mut ctx = PatchContext::new(env, options);
    ctx.enter_component(None, static_instance, dynamic_instance, true)
        .await?;
    ctx.drive().await?;
    ctx.tree.take().ok_or_else(|| {
        OptimizeError::RootRender("traversal finished without a root record".into())
    })
}
