//! Code generation from the mutated syntax tree back to source.

use gesso_maquette::ast::{AstArena, ExprId, ExprKind, RenderAst, UnOp};

// Binding powers; a child printed in a slot expecting at least `n` gets
// parenthesized when its own power is lower.
const PREC_CONDITIONAL: u8 = 1;
const PREC_UNARY: u8 = 7;
const PREC_POSTFIX: u8 = 8;

/// Serialize a whole render function
pub fn generate(ast: &RenderAst) -> String {
    let mut out = String::new();
    write_expr(&ast.arena, ast.root, 0, &mut out);
    out
}

/// Serialize a single expression
pub fn generate_expr(arena: &AstArena, id: ExprId) -> String {
    let mut out = String::new();
    write_expr(arena, id, 0, &mut out);
    out
}

fn prec_of(arena: &AstArena, id: ExprId) -> u8 {
    match arena.kind(id) {
        ExprKind::Conditional { .. } => PREC_CONDITIONAL,
        ExprKind::Binary { op, .. } => match op.as_str() {
            "||" => 2,
            "&&" => 3,
            "==" | "!=" | "===" | "!==" => 4,
            "<" | ">" | "<=" | ">=" => 5,
            _ => 6,
        },
        ExprKind::Unary { .. } => PREC_UNARY,
        _ => PREC_POSTFIX,
    }
}

fn write_expr(arena: &AstArena, id: ExprId, min_prec: u8, out: &mut String) {
    let own = prec_of(arena, id);
    let parens = own < min_prec;
    if parens {
        out.push('(');
    }

    match arena.kind(id) {
        ExprKind::Str(s) => write_string_literal(s, out),
        ExprKind::Num(n) => {
            if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                out.push_str(&format!("{}", *n as i64));
            } else {
                out.push_str(&format!("{}", n));
            }
        }
        ExprKind::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        ExprKind::Null => out.push_str("null"),
        ExprKind::Ident(name) => out.push_str(name),
        ExprKind::Member { object, property } => {
            write_expr(arena, *object, PREC_POSTFIX, out);
            out.push('.');
            out.push_str(property);
        }
        ExprKind::Call { callee, args } => {
            write_expr(arena, *callee, PREC_POSTFIX, out);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(arena, *arg, 0, out);
            }
            out.push(')');
        }
        ExprKind::Array(elements) => {
            out.push('[');
            for (i, el) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(arena, *el, 0, out);
            }
            out.push(']');
        }
        ExprKind::Object(properties) => {
            out.push('{');
            for (i, (key, value)) in properties.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                write_expr(arena, *value, 0, out);
            }
            out.push('}');
        }
        ExprKind::Binary { op, left, right } => {
            write_expr(arena, *left, own, out);
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            write_expr(arena, *right, own + 1, out);
        }
        ExprKind::Unary { op, expr } => {
            out.push_str(match op {
                UnOp::Not => "!",
                UnOp::Neg => "-",
            });
            write_expr(arena, *expr, PREC_UNARY, out);
        }
        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            write_expr(arena, *test, PREC_CONDITIONAL + 1, out);
            out.push_str(" ? ");
            write_expr(arena, *consequent, PREC_CONDITIONAL, out);
            out.push_str(" : ");
            write_expr(arena, *alternate, PREC_CONDITIONAL, out);
        }
        ExprKind::Return(expr) => {
            out.push_str("return ");
            write_expr(arena, *expr, 0, out);
        }
        ExprKind::Function { name, params, body } => {
            out.push_str("function ");
            if let Some(name) = name {
                out.push_str(name);
            }
            out.push('(');
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(param);
            }
            out.push_str(") {\n");
            for stmt in body {
                out.push_str("  ");
                write_expr(arena, *stmt, 0, out);
                out.push('\n');
            }
            out.push('}');
        }
    }

    if parens {
        out.push(')');
    }
}

fn write_string_literal(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_render_fn;

    fn roundtrip_expr(source: &str) -> String {
        let ast = parse_render_fn(source).expect("parse");
        let ExprKind::Function { body, .. } = ast.arena.kind(ast.root) else {
            panic!("not a function");
        };
        let ExprKind::Return(expr) = ast.arena.kind(body[0]) else {
            panic!("not a return");
        };
        generate_expr(&ast.arena, *expr)
    }

    #[test]
    fn prints_helper_calls() {
        insta::assert_snapshot!(
            roundtrip_expr("_c(\"div\", [_v(_s(count))])"),
            @r#"_c("div", [_v(_s(count))])"#
        );
    }

    #[test]
    fn escapes_string_literals() {
        insta::assert_snapshot!(
            roundtrip_expr("_ssrNode(\"<a href=\\\"/x\\\">go</a>\")"),
            @r#"_ssrNode("<a href=\"/x\">go</a>")"#
        );
    }

    #[test]
    fn parenthesizes_conditional_inside_concat() {
        insta::assert_snapshot!(
            roundtrip_expr("\"a\" + (flag ? \"b\" : \"c\")"),
            @r#""a" + (flag ? "b" : "c")"#
        );
    }

    #[test]
    fn prints_full_function() {
        let ast =
            parse_render_fn("function render() { return _ssrNode(\"<p>x</p>\") }").expect("parse");
        assert_eq!(
            generate(&ast),
            "function render() {\n  return _ssrNode(\"<p>x</p>\")\n}"
        );
    }

    #[test]
    fn integer_numbers_print_without_fraction() {
        assert_eq!(roundtrip_expr("_v(_s(5))"), "_v(_s(5))");
    }
}
