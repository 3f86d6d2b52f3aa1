//! DOM tag configuration tables.

use phf::{phf_set, Set};

/// Void (unary) HTML elements. These never carry children and are never
/// written with an end tag.
static VOID_TAGS: Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
};

/// Attributes that are rendered as `name="name"` when truthy and omitted
/// entirely when falsy.
static BOOLEAN_ATTRS: Set<&'static str> = phf_set! {
    "allowfullscreen", "async", "autofocus", "autoplay", "checked",
    "controls", "default", "defer", "disabled", "formnovalidate", "hidden",
    "loop", "multiple", "muted", "nomodule", "novalidate", "open",
    "readonly", "required", "reversed", "selected",
};

/// Whether a tag is a void element
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(tag)
}

/// Whether an attribute is a boolean attribute
pub fn is_boolean_attr(name: &str) -> bool {
    BOOLEAN_ATTRS.contains(name)
}
