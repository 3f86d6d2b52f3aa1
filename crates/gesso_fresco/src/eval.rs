//! Constant evaluation of render-expression tests.
//!
//! Conditional (`v-if`) branches in a compiled render function are ternaries
//! whose tests read instance state. To line a static child list up against
//! its syntax nodes the engine evaluates those tests against the static
//! instance, following the language's truthiness and coercion rules. Any
//! expression outside the evaluable subset (calls in particular) yields
//! `None`, and callers degrade to the unmatched path.

use gesso_maquette::ast::{AstArena, BinOp, ExprId, ExprKind, UnOp};
use serde_json::Value;

use crate::instance::ComponentInstance;

/// Truthiness under the source language's rules
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Evaluate an expression against instance state, or `None` when it falls
/// outside the evaluable subset.
pub fn evaluate(
    arena: &AstArena,
    id: ExprId,
    instance: &dyn ComponentInstance,
) -> Option<Value> {
    match arena.kind(id) {
        ExprKind::Str(s) => Some(Value::String(s.clone())),
        ExprKind::Num(n) => number(*n),
        ExprKind::Bool(b) => Some(Value::Bool(*b)),
        ExprKind::Null => Some(Value::Null),
        ExprKind::Ident(_) | ExprKind::Member { .. } => {
            let path = state_path(arena, id)?;
            // A bare instance reference is not state
            if path.is_empty() {
                return None;
            }
            // A missing property reads as undefined, which folds to null
            Some(instance.get(&path).unwrap_or(Value::Null))
        }
        ExprKind::Unary { op, expr } => {
            let value = evaluate(arena, *expr, instance)?;
            match op {
                UnOp::Not => Some(Value::Bool(!is_truthy(&value))),
                UnOp::Neg => number(-as_number(&value)?),
            }
        }
        ExprKind::Binary { op, left, right } => {
            let left = evaluate(arena, *left, instance)?;
            // Logical operators return an operand, not a boolean
            match op {
                BinOp::And => {
                    return if is_truthy(&left) {
                        evaluate(arena, *right, instance)
                    } else {
                        Some(left)
                    };
                }
                BinOp::Or => {
                    return if is_truthy(&left) {
                        Some(left)
                    } else {
                        evaluate(arena, *right, instance)
                    };
                }
                _ => {}
            }
            let right = evaluate(arena, *right, instance)?;
            binary(*op, &left, &right)
        }
        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            let test = evaluate(arena, *test, instance)?;
            let branch = if is_truthy(&test) { consequent } else { alternate };
            evaluate(arena, *branch, instance)
        }
        // Calls, literals-of-nodes and statements are not evaluable state
        ExprKind::Call { .. }
        | ExprKind::Array(_)
        | ExprKind::Object(_)
        | ExprKind::Return(_)
        | ExprKind::Function { .. } => None,
    }
}

/// Follow conditional nodes to the branch the static instance takes.
///
/// Returns the resolved (non-conditional) node, or `None` when a test is not
/// evaluable, in which case the caller must treat the parent as unmatched.
pub fn resolve_conditionals(
    arena: &AstArena,
    mut id: ExprId,
    instance: &dyn ComponentInstance,
) -> Option<ExprId> {
    while let ExprKind::Conditional {
        test,
        consequent,
        alternate,
    } = arena.kind(id)
    {
        let test = evaluate(arena, *test, instance)?;
        id = if is_truthy(&test) { *consequent } else { *alternate };
    }
    Some(id)
}

/// Dotted state path of an identifier or member chain. The `_vm` and `this`
/// bases name the instance itself and contribute no segment.
fn state_path(arena: &AstArena, id: ExprId) -> Option<String> {
    match arena.kind(id) {
        ExprKind::Ident(name) => {
            if name == "_vm" || name == "this" {
                Some(String::new())
            } else {
                Some(name.to_string())
            }
        }
        ExprKind::Member { object, property } => {
            let base = state_path(arena, *object)?;
            if base.is_empty() {
                Some(property.to_string())
            } else {
                Some(format!("{base}.{property}"))
            }
        }
        _ => None,
    }
}

fn binary(op: BinOp, left: &Value, right: &Value) -> Option<Value> {
    match op {
        BinOp::Add => {
            if let (Value::String(_), _) | (_, Value::String(_)) = (left, right) {
                Some(Value::String(format!(
                    "{}{}",
                    display(left),
                    display(right)
                )))
            } else {
                number(as_number(left)? + as_number(right)?)
            }
        }
        BinOp::Sub => number(as_number(left)? - as_number(right)?),
        BinOp::Lt => compare(left, right, |o| o == std::cmp::Ordering::Less),
        BinOp::Gt => compare(left, right, |o| o == std::cmp::Ordering::Greater),
        BinOp::Le => compare(left, right, |o| o != std::cmp::Ordering::Greater),
        BinOp::Ge => compare(left, right, |o| o != std::cmp::Ordering::Less),
        BinOp::StrictEq => Some(Value::Bool(strict_eq(left, right))),
        BinOp::StrictNotEq => Some(Value::Bool(!strict_eq(left, right))),
        BinOp::Eq => Some(Value::Bool(loose_eq(left, right)?)),
        BinOp::NotEq => Some(Value::Bool(!loose_eq(left, right)?)),
        BinOp::And | BinOp::Or => None,
    }
}

fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn loose_eq(left: &Value, right: &Value) -> Option<bool> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(true),
        (Value::Null, _) | (_, Value::Null) => Some(false),
        (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => {
            Some(strict_eq(a, b))
        }
        (a, b) => Some(as_number(a)? == as_number(b)?),
    }
}

fn compare(
    left: &Value,
    right: &Value,
    check: impl Fn(std::cmp::Ordering) -> bool,
) -> Option<Value> {
    let ordering = if let (Value::String(a), Value::String(b)) = (left, right) {
        a.cmp(b)
    } else {
        as_number(left)?.partial_cmp(&as_number(right)?)?
    };
    Some(Value::Bool(check(ordering)))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse().ok()
            }
        }
        _ => None,
    }
}

fn number(n: f64) -> Option<Value> {
    serde_json::Number::from_f64(n).map(Value::Number)
}

/// String form used by `+` concatenation
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
