//! Palette - The shared toolbox for Gesso.
//!
//! This crate provides the foundational utilities the Gesso SSR optimizer
//! leans on everywhere: HTML escaping, the void-tag table, and the hashing
//! and string types used across the workspace.
//!
//! ## Name Origin
//!
//! A **palette** is the board on which a painter lays out and mixes the
//! pigments every stroke will draw from. This crate is the board the rest
//! of the workspace mixes from.

pub mod dom_tags;
pub mod html;

pub use dom_tags::{is_boolean_attr, is_void_tag};
pub use html::{escape_html, escape_html_attr};

// Re-export rustc-hash types for convenience
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};
