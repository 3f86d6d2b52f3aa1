//! Stencil - Render-function source parser and code generator for Gesso.
//!
//! A compiled render function is source text in a small expression language:
//! helper calls (`_c`, `_ssrNode`, `_v`, ...), array literals, string
//! literals, `+` concatenation chains, and ternaries. This crate turns that
//! text into the arena-indexed syntax tree the optimizer mutates, and turns a
//! mutated tree back into executable source.
//!
//! ## Name Origin
//!
//! A **stencil** carries a design back and forth between surfaces: cut it
//! from a drawing, and you can reproduce the drawing anywhere. Parsing cuts
//! the stencil; code generation presses it back onto paper.

pub mod codegen;
pub mod parser;
pub mod tokenizer;

pub use codegen::{generate, generate_expr};
pub use parser::{parse_render_fn, ParseError};
