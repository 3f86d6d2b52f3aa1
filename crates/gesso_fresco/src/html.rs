//! Plain serialization of a static subtree.
//!
//! Used as the validation pass for fully folded components: the literal the
//! syntax-tree rewrite produced must match what a direct walk of the static
//! vnode tree serializes to. Component and async placeholders inside the
//! subtree serialize through their recorded literals, which exist whenever
//! the enclosing component folded.

use gesso_maquette::{VNode, VNodeArena, VNodeId};
use gesso_palette::html::escape_html;
use gesso_palette::is_void_tag;

use crate::facts::FactsTable;
use crate::instance::{InstanceHandle, RenderEnvironment};

/// Serialize a static subtree, or `None` if a node inside it has no
/// serializable form.
pub fn render_subtree(
    env: &dyn RenderEnvironment,
    arena: &VNodeArena,
    facts: &FactsTable,
    id: VNodeId,
    active: Option<&InstanceHandle>,
    is_root: bool,
) -> Option<String> {
    let mut out = String::new();
    write_node(env, arena, facts, id, active, is_root, &mut out)?;
    Some(out)
}

fn write_node(
    env: &dyn RenderEnvironment,
    arena: &VNodeArena,
    facts: &FactsTable,
    id: VNodeId,
    active: Option<&InstanceHandle>,
    is_root: bool,
    out: &mut String,
) -> Option<()> {
    match &arena[facts.resolve(id)] {
        VNode::Element(el) => {
            out.push_str(&env.render_starting_tag(arena, facts.resolve(id), active, is_root));
            if is_void_tag(&el.tag) {
                return Some(());
            }
            for child in &el.children {
                write_node(env, arena, facts, *child, active, false, out)?;
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
            Some(())
        }
        VNode::Text(text) => {
            if text.raw {
                out.push_str(&text.text);
            } else {
                out.push_str(&escape_html(&text.text));
            }
            Some(())
        }
        VNode::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(&comment.text);
            out.push_str("-->");
            Some(())
        }
        VNode::StringNode(sn) => {
            out.push_str(&sn.open);
            for child in &sn.children {
                write_node(env, arena, facts, *child, active, false, out)?;
            }
            out.push_str(&sn.close);
            Some(())
        }
        VNode::Component(_) | VNode::AsyncPlaceholder(_) => {
            let node_facts = facts.get(id);
            if node_facts.ssr_static {
                out.push_str(node_facts.ssr_string.as_deref()?);
                Some(())
            } else {
                None
            }
        }
    }
}
