//! End-to-end optimizer tests.
//!
//! Each test wires a small component registry into a fixture render
//! environment, runs the two-sided traversal, and inspects the emitted
//! render tree: what folded to a literal, what stayed code, and how the
//! per-component records nest.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use compact_str::CompactString;
use gesso_fresco::{
    optimize, CompiledRender, ComponentInstance, InstanceHandle, OptimizeError, OptimizeOptions,
    RenderEnvironment, SsrRenderTree,
};
use gesso_maquette::{
    AsyncComponentFactory, AsyncMeta, AttrValue, ComponentNode, ComponentOptions, LocalBoxFuture,
    ResolveError, ResolvedComponent, VNode, VNodeArena, VNodeData, VNodeId,
};
use gesso_palette::html::escape_html_attr;
use gesso_palette::{is_void_tag, FxHashMap};
use serde_json::{json, Value};

type BuildFn = Rc<dyn Fn(&mut VNodeArena, &Value) -> VNodeId>;

struct TestComponent {
    source: Option<&'static str>,
    state: Value,
    build: BuildFn,
    styles: FxHashMap<CompactString, String>,
    prefetch_error: Option<String>,
}

impl ComponentInstance for TestComponent {
    fn render(&self, arena: &mut VNodeArena) -> Result<VNodeId, OptimizeError> {
        Ok((self.build)(arena, &self.state))
    }

    fn render_source(&self) -> Option<&str> {
        self.source
    }

    fn server_prefetch(&self) -> LocalBoxFuture<'_, Result<(), OptimizeError>> {
        Box::pin(async {
            match &self.prefetch_error {
                Some(message) => Err(OptimizeError::Prefetch(message.clone())),
                None => Ok(()),
            }
        })
    }

    fn get(&self, path: &str) -> Option<Value> {
        let mut current = &self.state;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    fn styles(&self) -> FxHashMap<CompactString, String> {
        self.styles.clone()
    }
}

struct ComponentDef {
    source: Option<&'static str>,
    build: BuildFn,
    styles: FxHashMap<CompactString, String>,
}

#[derive(Default)]
struct TestEnv {
    registry: FxHashMap<CompactString, ComponentDef>,
}

impl TestEnv {
    fn register(
        &mut self,
        name: &str,
        source: &'static str,
        build: impl Fn(&mut VNodeArena, &Value) -> VNodeId + 'static,
    ) {
        self.registry.insert(
            CompactString::from(name),
            ComponentDef {
                source: Some(source),
                build: Rc::new(build),
                styles: FxHashMap::default(),
            },
        );
    }

    fn register_with_style(
        &mut self,
        name: &str,
        source: &'static str,
        style: (&str, &str),
        build: impl Fn(&mut VNodeArena, &Value) -> VNodeId + 'static,
    ) {
        let mut styles = FxHashMap::default();
        styles.insert(CompactString::from(style.0), style.1.to_string());
        self.registry.insert(
            CompactString::from(name),
            ComponentDef {
                source: Some(source),
                build: Rc::new(build),
                styles,
            },
        );
    }
}

fn starting_tag(arena: &VNodeArena, node: VNodeId, is_root: bool) -> String {
    let VNode::Element(el) = &arena[node] else {
        return String::new();
    };
    let mut tag = format!("<{}", el.tag);
    if is_root {
        tag.push_str(" data-server-rendered=\"true\"");
    }
    for (name, value) in &el.data.attrs {
        match value {
            AttrValue::Text(text) => {
                tag.push_str(&format!(" {name}=\"{}\"", escape_html_attr(text)));
            }
            AttrValue::Bool(true) => tag.push_str(&format!(" {name}=\"{name}\"")),
            AttrValue::Bool(false) => {}
        }
    }
    if let Some(class) = &el.data.class {
        tag.push_str(&format!(" class=\"{}\"", escape_html_attr(class)));
    }
    if !el.data.style.is_empty() {
        let style: Vec<String> = el
            .data
            .style
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        tag.push_str(&format!(" style=\"{}\"", escape_html_attr(&style.join(";"))));
    }
    if let Some(scope) = &el.data.scope_id {
        tag.push_str(&format!(" {scope}"));
    }
    tag.push('>');
    tag
}

impl RenderEnvironment for TestEnv {
    fn create_component_instance(
        &self,
        node: &ComponentNode,
        _parent: Option<&InstanceHandle>,
    ) -> Result<InstanceHandle, OptimizeError> {
        let def = self.registry.get(&node.options.name).ok_or_else(|| {
            OptimizeError::Instantiate(format!("unknown component `{}`", node.options.name))
        })?;
        Ok(Rc::new(TestComponent {
            source: def.source,
            state: node.options.props.clone(),
            build: def.build.clone(),
            styles: def.styles.clone(),
            prefetch_error: None,
        }))
    }

    fn render_starting_tag(
        &self,
        arena: &VNodeArena,
        node: VNodeId,
        _active: Option<&InstanceHandle>,
        is_root: bool,
    ) -> String {
        starting_tag(arena, node, is_root)
    }
}

fn instance(source: &'static str, state: Value, build: impl Fn(&mut VNodeArena, &Value) -> VNodeId + 'static) -> InstanceHandle {
    Rc::new(TestComponent {
        source: Some(source),
        state,
        build: Rc::new(build),
        styles: FxHashMap::default(),
        prefetch_error: None,
    })
}

fn component_placeholder(
    arena: &mut VNodeArena,
    name: &str,
    props: Value,
) -> VNodeId {
    arena.alloc_component(
        name,
        VNodeData::default(),
        ComponentOptions {
            name: CompactString::from(name),
            props,
            listeners: FxHashMap::default(),
            children: Vec::new(),
        },
    )
}

async fn run(
    env: &TestEnv,
    static_instance: InstanceHandle,
    dynamic_instance: InstanceHandle,
) -> SsrRenderTree {
    optimize(env, static_instance, dynamic_instance, OptimizeOptions::default())
        .await
        .expect("optimize")
}

fn optimized_source(tree: &SsrRenderTree) -> &str {
    match &tree.render {
        CompiledRender::Optimized { source } => source,
        other => panic!("expected optimized render, got {other:?}"),
    }
}

fn static_html(tree: &SsrRenderTree) -> &str {
    match &tree.render {
        CompiledRender::Static { html } => html,
        other => panic!("expected static render, got {other:?}"),
    }
}

// =============================================================================
// Full folding
// =============================================================================

mod full_folding {
    use super::*;

    fn hello() -> InstanceHandle {
        instance(
            "function render() { return _c(\"div\", [_v(\"hello\")]) }",
            json!({}),
            |arena, _| {
                let text = arena.alloc_text("hello", false);
                arena.alloc_element("div", VNodeData::default(), vec![text])
            },
        )
    }

    #[tokio::test]
    async fn identical_renders_fold_to_one_literal() {
        let env = TestEnv::default();
        let tree = run(&env, hello(), hello()).await;
        assert!(tree.is_static);
        assert_eq!(
            static_html(&tree),
            "<div data-server-rendered=\"true\">hello</div>"
        );
        assert!(tree.children.is_none());
    }

    #[tokio::test]
    async fn repeated_runs_produce_equal_trees() {
        let env = TestEnv::default();
        let first = run(&env, hello(), hello()).await;
        let second = run(&env, hello(), hello()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn escaped_text_folds_escaped() {
        let make = || {
            instance(
                "function render() { return _c(\"div\", [_v(\"a < b\")]) }",
                json!({}),
                |arena, _| {
                    let text = arena.alloc_text("a < b", false);
                    arena.alloc_element("div", VNodeData::default(), vec![text])
                },
            )
        };
        let env = TestEnv::default();
        let tree = run(&env, make(), make()).await;
        assert!(static_html(&tree).contains("a &lt; b"));
    }

    #[tokio::test]
    async fn unrecognized_render_shape_can_still_prove_static() {
        // No create-element call to rewrite, but both renders agree, so the
        // boundary is proven static at the vnode level alone.
        let make = || {
            instance("somewhere.else", json!({}), |arena, _| {
                arena.alloc_element("div", VNodeData::default(), vec![])
            })
        };
        let env = TestEnv::default();
        let tree = run(&env, make(), make()).await;
        assert!(tree.is_static);
        assert_eq!(
            static_html(&tree),
            "<div data-server-rendered=\"true\"></div>"
        );
    }
}

// =============================================================================
// Partial folding
// =============================================================================

mod partial_folding {
    use super::*;

    fn page(msg: &str) -> InstanceHandle {
        let msg_owned = msg.to_string();
        instance(
            "function render() { return _c(\"div\", [_c(\"p\", [_v(\"head\")]), _v(_s(_vm.msg)), _c(\"p\", [_v(\"tail\")])]) }",
            json!({ "msg": msg }),
            move |arena, _| {
                let head_text = arena.alloc_text("head", false);
                let head = arena.alloc_element("p", VNodeData::default(), vec![head_text]);
                let middle = arena.alloc_text(&msg_owned, false);
                let tail_text = arena.alloc_text("tail", false);
                let tail = arena.alloc_element("p", VNodeData::default(), vec![tail_text]);
                arena.alloc_element("div", VNodeData::default(), vec![head, middle, tail])
            },
        )
    }

    #[tokio::test]
    async fn static_edges_become_string_nodes_around_dynamic_middle() {
        let env = TestEnv::default();
        let tree = run(&env, page("a"), page("b")).await;
        assert!(!tree.is_static);
        let source = optimized_source(&tree);
        assert!(source.contains("_ssrNode(\"<p>head</p>\")"), "{source}");
        assert!(source.contains("_v(_s(_vm.msg))"), "{source}");
        assert!(source.contains("_ssrNode(\"<p>tail</p>\")"), "{source}");
    }

    #[tokio::test]
    async fn matching_dynamic_values_fold_entirely() {
        // Same request data on both sides means the interpolation happened to
        // agree; the middle folds into the run like any static child.
        let env = TestEnv::default();
        let tree = run(&env, page("same"), page("same")).await;
        assert!(tree.is_static);
        assert_eq!(
            static_html(&tree),
            "<div data-server-rendered=\"true\"><p>head</p>same<p>tail</p></div>"
        );
    }

    #[tokio::test]
    async fn differing_interpolation_keeps_the_expression() {
        let counter = |count: u32| {
            instance(
                "function render() { return _c(\"div\", [_v(_s(_vm.count))]) }",
                json!({ "count": count }),
                move |arena, _| {
                    let text = arena.alloc_text(count.to_string(), false);
                    arena.alloc_element("div", VNodeData::default(), vec![text])
                },
            )
        };
        let env = TestEnv::default();
        let tree = run(&env, counter(0), counter(5)).await;
        assert!(!tree.is_static);
        assert!(optimized_source(&tree).contains("_v(_s(_vm.count))"));
    }
}

// =============================================================================
// String nodes
// =============================================================================

mod string_nodes {
    use super::*;

    #[tokio::test]
    async fn childless_string_nodes_compare_trimmed() {
        let make = |markup: &'static str| {
            instance("_ssrNode(\"<div>x</div>\")", json!({}), move |arena, _| {
                arena.alloc_string_node(markup, "", vec![])
            })
        };
        let env = TestEnv::default();
        let tree = run(&env, make("<div>x</div>"), make("<div>x</div> ")).await;
        assert!(tree.is_static);
        // The static side's untrimmed markup is what gets captured
        assert_eq!(static_html(&tree), "<div>x</div>");
    }

    #[tokio::test]
    async fn string_node_with_static_child_collapses_to_one_literal() {
        let make = || {
            instance(
                "_ssrNode(\"<div>\", \"</div>\", [_v(\"x\")])",
                json!({}),
                |arena, _| {
                    let text = arena.alloc_text("x", false);
                    arena.alloc_string_node("<div>", "</div>", vec![text])
                },
            )
        };
        let env = TestEnv::default();
        let tree = run(&env, make(), make()).await;
        assert!(tree.is_static);
        assert_eq!(static_html(&tree), "<div>x</div>");
    }

    #[tokio::test]
    async fn string_node_keeps_its_dynamic_child() {
        let make = |value: &str| {
            let value = value.to_string();
            instance(
                "_ssrNode(\"<div>\", \"</div>\", [_v(_s(_vm.x))])",
                json!({ "x": value.clone() }),
                move |arena, _| {
                    let text = arena.alloc_text(&value, false);
                    arena.alloc_string_node("<div>", "</div>", vec![text])
                },
            )
        };
        let env = TestEnv::default();
        let tree = run(&env, make("a"), make("b")).await;
        assert!(!tree.is_static);
        assert!(optimized_source(&tree).contains("_v(_s(_vm.x))"));
    }
}

// =============================================================================
// Conditional rendering
// =============================================================================

mod conditionals {
    use super::*;

    fn toggled(show: bool, label: &str) -> InstanceHandle {
        let label = label.to_string();
        instance(
            "function render() { return _c(\"div\", [_vm.show ? _c(\"p\", [_v(_s(_vm.label))]) : _c(\"span\", [_v(\"off\")])]) }",
            json!({ "show": show, "label": label }),
            move |arena, state| {
                let child = if state["show"].as_bool().unwrap_or(false) {
                    let text = arena.alloc_text(state["label"].as_str().unwrap_or(""), false);
                    arena.alloc_element("p", VNodeData::default(), vec![text])
                } else {
                    let text = arena.alloc_text("off", false);
                    arena.alloc_element("span", VNodeData::default(), vec![text])
                };
                arena.alloc_element("div", VNodeData::default(), vec![child])
            },
        )
    }

    #[tokio::test]
    async fn taken_branch_binds_and_folds() {
        let env = TestEnv::default();
        let tree = run(&env, toggled(true, "on"), toggled(true, "on")).await;
        assert!(tree.is_static);
        assert_eq!(
            static_html(&tree),
            "<div data-server-rendered=\"true\"><p>on</p></div>"
        );
    }

    #[tokio::test]
    async fn taken_branch_keeps_its_dynamic_interpolation() {
        let env = TestEnv::default();
        let tree = run(&env, toggled(true, "x"), toggled(true, "y")).await;
        assert!(!tree.is_static);
        let source = optimized_source(&tree);
        // The branch resolved to the consequent; its interpolation survives
        assert!(source.contains("_v(_s(_vm.label))"), "{source}");
    }
}

// =============================================================================
// Conservative bail-outs
// =============================================================================

mod bail_outs {
    use super::*;

    #[tokio::test]
    async fn differing_child_counts_leave_the_parent_unfolded() {
        let list = |items: Vec<&str>| {
            let items: Vec<String> = items.into_iter().map(str::to_string).collect();
            instance(
                "function render() { return _c(\"ul\", [_l(_vm.items)]) }",
                json!({ "items": items.clone() }),
                move |arena, _| {
                    let children: Vec<VNodeId> = items
                        .iter()
                        .map(|item| {
                            let text = arena.alloc_text(item, false);
                            arena.alloc_element("li", VNodeData::default(), vec![text])
                        })
                        .collect();
                    arena.alloc_element("ul", VNodeData::default(), children)
                },
            )
        };
        let env = TestEnv::default();
        let tree = run(&env, list(vec![]), list(vec!["a", "b", "c", "d", "e"])).await;
        assert!(!tree.is_static);
        // Nothing was rewritten; the list helper is still in the source
        assert!(optimized_source(&tree).contains("_l(_vm.items)"));
    }

    #[tokio::test]
    async fn list_helper_among_children_disables_splicing() {
        // Counts happen to agree (one rendered item each) but a list helper
        // makes the correspondence unreliable, so only string annotation is
        // allowed and the differing item blocks folding.
        let list = |item: &str| {
            let item = item.to_string();
            instance(
                "function render() { return _c(\"ul\", [_l(_vm.items)]) }",
                json!({ "items": [item.clone()] }),
                move |arena, _| {
                    let text = arena.alloc_text(&item, false);
                    let li = arena.alloc_element("li", VNodeData::default(), vec![text]);
                    arena.alloc_element("ul", VNodeData::default(), vec![li])
                },
            )
        };
        let env = TestEnv::default();
        let tree = run(&env, list("a"), list("b")).await;
        assert!(!tree.is_static);
        assert!(optimized_source(&tree).contains("_l(_vm.items)"));
    }

    #[tokio::test]
    async fn tag_mismatch_is_not_an_error() {
        let shape = |tag: &'static str| {
            instance(
                "function render() { return _c(\"div\", [_v(\"x\")]) }",
                json!({}),
                move |arena, _| {
                    let text = arena.alloc_text("x", false);
                    arena.alloc_element(tag, VNodeData::default(), vec![text])
                },
            )
        };
        let env = TestEnv::default();
        let tree = run(&env, shape("div"), shape("section")).await;
        assert!(!tree.is_static);
    }
}

// =============================================================================
// Component boundaries
// =============================================================================

mod components {
    use super::*;

    fn fixed_child_env() -> TestEnv {
        let mut env = TestEnv::default();
        env.register_with_style(
            "fixed-child",
            "function render() { return _c(\"span\", [_v(\"fixed\")]) }",
            ("data-v-fixed", ".fixed{}"),
            |arena, _| {
                let text = arena.alloc_text("fixed", false);
                arena.alloc_element("span", VNodeData::default(), vec![text])
            },
        );
        env.register(
            "noisy-child",
            "function render() { return _c(\"p\", [_v(_s(_vm.msg))]) }",
            |arena, state| {
                let text = arena.alloc_text(state["msg"].as_str().unwrap_or(""), false);
                arena.alloc_element("p", VNodeData::default(), vec![text])
            },
        );
        env
    }

    fn parent_with_fixed_child(msg: &str) -> InstanceHandle {
        let msg = msg.to_string();
        instance(
            "function render() { return _c(\"div\", [_c(\"fixed-child\"), _v(_s(_vm.msg))]) }",
            json!({ "msg": msg }),
            move |arena, state| {
                let child = component_placeholder(arena, "fixed-child", Value::Null);
                let text = arena.alloc_text(state["msg"].as_str().unwrap_or(""), false);
                arena.alloc_element("div", VNodeData::default(), vec![child, text])
            },
        )
    }

    #[tokio::test]
    async fn static_child_component_folds_out_of_the_parent_source() {
        let env = fixed_child_env();
        let tree = run(
            &env,
            parent_with_fixed_child("a"),
            parent_with_fixed_child("b"),
        )
        .await;

        let source = optimized_source(&tree);
        assert!(source.contains("_ssrNode(\"<span>fixed</span>\")"), "{source}");
        assert!(!source.contains("fixed-child"), "{source}");

        // The folded child's record is pruned and its styles hoist up
        assert!(tree.children.is_none());
        let styles = tree.styles.as_ref().expect("hoisted styles");
        assert_eq!(styles.get("data-v-fixed").map(String::as_str), Some(".fixed{}"));
    }

    #[tokio::test]
    async fn mixed_child_records_are_kept_in_order() {
        let env = fixed_child_env();
        let parent = |msg: &str| {
            let msg = msg.to_string();
            instance(
                "function render() { return _c(\"div\", [_c(\"fixed-child\"), _c(\"noisy-child\")]) }",
                json!({ "msg": msg }),
                move |arena, state| {
                    let fixed = component_placeholder(arena, "fixed-child", Value::Null);
                    let noisy =
                        component_placeholder(arena, "noisy-child", json!({ "msg": state["msg"] }));
                    arena.alloc_element("div", VNodeData::default(), vec![fixed, noisy])
                },
            )
        };
        let tree = run(&env, parent("a"), parent("b")).await;

        let children = tree.children.as_ref().expect("children kept");
        assert_eq!(children.len(), 2);
        assert!(children[0].is_static);
        assert_eq!(static_html(&children[0]), "<span>fixed</span>");
        assert!(!children[1].is_static);
    }

    #[tokio::test]
    async fn missing_root_render_source_is_an_error() {
        let make = || -> InstanceHandle {
            Rc::new(TestComponent {
                source: None,
                state: json!({}),
                build: Rc::new(|arena, _| {
                    arena.alloc_element("div", VNodeData::default(), vec![])
                }),
                styles: FxHashMap::default(),
                prefetch_error: None,
            })
        };
        let env = TestEnv::default();
        let err = optimize(&env, make(), make(), OptimizeOptions::default())
            .await
            .expect_err("should fail");
        assert!(matches!(err, OptimizeError::RootRender(_)));
    }

    #[tokio::test]
    async fn rejected_prefetch_propagates() {
        let make = |fail: bool| -> InstanceHandle {
            Rc::new(TestComponent {
                source: Some("function render() { return _c(\"div\") }"),
                state: json!({}),
                build: Rc::new(|arena, _| {
                    arena.alloc_element("div", VNodeData::default(), vec![])
                }),
                styles: FxHashMap::default(),
                prefetch_error: fail.then(|| "upstream down".to_string()),
            })
        };
        let env = TestEnv::default();
        let err = optimize(&env, make(false), make(true), OptimizeOptions::default())
            .await
            .expect_err("should fail");
        assert!(matches!(err, OptimizeError::Prefetch(_)));
    }
}

// =============================================================================
// Async components
// =============================================================================

mod async_components {
    use super::*;

    struct OnceFactory(RefCell<Option<ResolvedComponent>>);

    impl OnceFactory {
        fn handle(resolved: ResolvedComponent) -> Rc<Self> {
            Rc::new(Self(RefCell::new(Some(resolved))))
        }
    }

    impl AsyncComponentFactory for OnceFactory {
        fn resolve(&self) -> LocalBoxFuture<'_, Result<ResolvedComponent, ResolveError>> {
            Box::pin(async {
                // A real suspension, so both sides genuinely join
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                self.0
                    .borrow_mut()
                    .take()
                    .ok_or_else(|| ResolveError("factory already consumed".into()))
            })
        }
    }

    fn lazy_env() -> TestEnv {
        let mut env = TestEnv::default();
        env.register(
            "lazy",
            "function render() { return _c(\"span\", [_v(\"lazy\")]) }",
            |arena, _| {
                let text = arena.alloc_text("lazy", false);
                arena.alloc_element("span", VNodeData::default(), vec![text])
            },
        );
        env
    }

    fn parent_with(resolved: ResolvedComponent) -> InstanceHandle {
        let factory = OnceFactory::handle(resolved);
        instance(
            "function render() { return _c(\"div\", [_c(\"lazy\")]) }",
            json!({}),
            move |arena, _| {
                let placeholder = arena.alloc_async(
                    factory.clone(),
                    AsyncMeta {
                        tag: "lazy".into(),
                        data: VNodeData::default(),
                        children: Vec::new(),
                    },
                );
                arena.alloc_element("div", VNodeData::default(), vec![placeholder])
            },
        )
    }

    fn options() -> ResolvedComponent {
        ResolvedComponent::Options {
            name: "lazy".into(),
            props: Value::Null,
        }
    }

    #[tokio::test]
    async fn equal_resolution_folds_through_the_placeholder() {
        let env = lazy_env();
        let tree = run(&env, parent_with(options()), parent_with(options())).await;
        assert!(tree.is_static);
        assert_eq!(
            static_html(&tree),
            "<div data-server-rendered=\"true\"><span>lazy</span></div>"
        );
        assert!(tree.children.is_none());
    }

    #[tokio::test]
    async fn shape_mismatch_falls_back_to_a_comment_placeholder() {
        let env = lazy_env();
        let nodes = ResolvedComponent::Nodes(Box::new(|arena: &mut VNodeArena| {
            vec![arena.alloc_text("x", false)]
        }));
        let tree = run(&env, parent_with(options()), parent_with(nodes)).await;
        assert!(tree.is_static);
        assert_eq!(
            static_html(&tree),
            "<div data-server-rendered=\"true\"><!----></div>"
        );
    }

    #[tokio::test]
    async fn equal_multi_root_resolutions_fold_as_a_fragment() {
        let env = lazy_env();
        let nodes = || {
            ResolvedComponent::Nodes(Box::new(|arena: &mut VNodeArena| {
                let a_text = arena.alloc_text("a", false);
                let a = arena.alloc_element("b", VNodeData::default(), vec![a_text]);
                let b_text = arena.alloc_text("c", false);
                let b = arena.alloc_element("i", VNodeData::default(), vec![b_text]);
                vec![a, b]
            }))
        };
        let tree = run(&env, parent_with(nodes()), parent_with(nodes())).await;
        assert!(tree.is_static);
        assert_eq!(
            static_html(&tree),
            "<div data-server-rendered=\"true\"><b>a</b><i>c</i></div>"
        );
    }

    #[tokio::test]
    async fn factory_rejection_propagates() {
        let env = lazy_env();
        let spent = Rc::new(OnceFactory(RefCell::new(None)));
        let parent = |factory: Rc<OnceFactory>| {
            instance(
                "function render() { return _c(\"div\", [_c(\"lazy\")]) }",
                json!({}),
                move |arena, _| {
                    let placeholder = arena.alloc_async(
                        factory.clone(),
                        AsyncMeta {
                            tag: "lazy".into(),
                            data: VNodeData::default(),
                            children: Vec::new(),
                        },
                    );
                    arena.alloc_element("div", VNodeData::default(), vec![placeholder])
                },
            )
        };
        let err = optimize(
            &env,
            parent(spent.clone()),
            parent(spent),
            OptimizeOptions::default(),
        )
        .await
        .expect_err("should fail");
        assert!(matches!(err, OptimizeError::Resolve(_)));
    }
}

// =============================================================================
// Literal validation
// =============================================================================

mod validation {
    use super::*;

    /// Starting tags drift after the first two calls, so the folded literal
    /// no longer matches a fresh serialization of the same subtree.
    #[derive(Default)]
    struct DriftingEnv {
        calls: Cell<u32>,
    }

    impl RenderEnvironment for DriftingEnv {
        fn create_component_instance(
            &self,
            node: &ComponentNode,
            _parent: Option<&InstanceHandle>,
        ) -> Result<InstanceHandle, OptimizeError> {
            Err(OptimizeError::Instantiate(format!(
                "unknown component `{}`",
                node.options.name
            )))
        }

        fn render_starting_tag(
            &self,
            arena: &VNodeArena,
            node: VNodeId,
            _active: Option<&InstanceHandle>,
            is_root: bool,
        ) -> String {
            let call = self.calls.get();
            self.calls.set(call + 1);
            let mut tag = starting_tag(arena, node, is_root);
            if call >= 2 {
                tag = tag.replace('>', " data-drift=\"1\">");
            }
            tag
        }
    }

    fn leaf() -> InstanceHandle {
        instance(
            "function render() { return _c(\"div\") }",
            json!({}),
            |arena, _| arena.alloc_element("div", VNodeData::default(), vec![]),
        )
    }

    #[tokio::test]
    async fn mismatched_literal_falls_back_to_the_original_render() {
        let env = DriftingEnv::default();
        let tree = optimize(&env, leaf(), leaf(), OptimizeOptions::default())
            .await
            .expect("optimize");
        assert!(!tree.is_static);
        assert!(matches!(tree.render, CompiledRender::Original { .. }));
    }

    #[tokio::test]
    async fn validation_can_be_disabled() {
        let env = DriftingEnv::default();
        let options = OptimizeOptions {
            validate_static: false,
        };
        let tree = optimize(&env, leaf(), leaf(), options)
            .await
            .expect("optimize");
        assert!(tree.is_static);
    }

    #[tokio::test]
    async fn void_tags_compare_on_the_full_start_tag() {
        let make = |src: &'static str| {
            instance(
                "function render() { return _c(\"img\") }",
                json!({}),
                move |arena, _| {
                    let mut data = VNodeData::default();
                    data.attrs
                        .push(("src".into(), AttrValue::Text(src.to_string())));
                    arena.alloc_element("img", data, vec![])
                },
            )
        };
        let env = TestEnv::default();
        let tree = run(&env, make("/a.png"), make("/a.png")).await;
        assert!(tree.is_static);
        assert!(is_void_tag("img"));
        assert_eq!(
            static_html(&tree),
            "<img data-server-rendered=\"true\" src=\"/a.png\">"
        );
    }
}
