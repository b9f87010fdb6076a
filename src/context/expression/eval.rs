//! Evaluation of whitelisted condition trees.

use super::parser::{BoolOp, CmpOp, Expr};
use crate::error::ConditionError;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Evaluate a tree that has already passed the whitelist check.
pub fn evaluate(expr: &Expr, vars: &Map<String, Value>) -> Result<Value, ConditionError> {
    match expr {
        Expr::Const(value) => Ok(value.clone()),
        Expr::Name(name) => vars
            .get(name)
            .cloned()
            .ok_or_else(|| ConditionError::UndefinedVariable { name: name.clone() }),
        Expr::Attribute { value, attr } => {
            let target = evaluate(value, vars)?;
            match target {
                Value::Object(mut map) => {
                    map.remove(attr)
                        .ok_or_else(|| ConditionError::MissingAttribute {
                            attribute: attr.clone(),
                            target: "mapping".to_string(),
                        })
                }
                other => Err(ConditionError::MissingAttribute {
                    attribute: attr.clone(),
                    target: type_name(&other).to_string(),
                }),
            }
        }
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, vars))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Not(operand) => Ok(Value::Bool(!is_truthy(&evaluate(operand, vars)?))),
        Expr::BoolOp { op, values } => {
            let mut last = Value::Null;
            for value in values {
                last = evaluate(value, vars)?;
                let truthy = is_truthy(&last);
                match op {
                    BoolOp::And if !truthy => return Ok(last),
                    BoolOp::Or if truthy => return Ok(last),
                    _ => {}
                }
            }
            Ok(last)
        }
        Expr::Compare { left, comparisons } => {
            let mut lhs = evaluate(left, vars)?;
            for (op, right) in comparisons {
                let rhs = evaluate(right, vars)?;
                if !compare(*op, &lhs, &rhs)? {
                    return Ok(Value::Bool(false));
                }
                lhs = rhs;
            }
            Ok(Value::Bool(true))
        }
        other => Err(ConditionError::UnsafeExpression {
            expression: format!("{:?}", other),
            reason: "node is not whitelisted".to_string(),
        }),
    }
}

/// Truthiness: null, false, zero, and empty strings, sequences, and
/// mappings are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, ConditionError> {
    match op {
        CmpOp::Eq | CmpOp::Is => Ok(values_equal(lhs, rhs)),
        CmpOp::Ne | CmpOp::IsNot => Ok(!values_equal(lhs, rhs)),
        CmpOp::Lt => order(op, lhs, rhs).map(|o| o == Ordering::Less),
        CmpOp::Le => order(op, lhs, rhs).map(|o| o != Ordering::Greater),
        CmpOp::Gt => order(op, lhs, rhs).map(|o| o == Ordering::Greater),
        CmpOp::Ge => order(op, lhs, rhs).map(|o| o != Ordering::Less),
        CmpOp::In => contains(rhs, lhs),
        CmpOp::NotIn => contains(rhs, lhs).map(|found| !found),
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => lhs == rhs,
    }
}

fn order(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<Ordering, ConditionError> {
    let ordering = match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };

    ordering.ok_or_else(|| ConditionError::TypeMismatch {
        message: format!(
            "'{}' not supported between {} and {}",
            op.symbol(),
            type_name(lhs),
            type_name(rhs)
        ),
    })
}

fn contains(container: &Value, item: &Value) -> Result<bool, ConditionError> {
    match (container, item) {
        (Value::String(haystack), Value::String(needle)) => Ok(haystack.contains(needle.as_str())),
        (Value::String(_), other) => Err(ConditionError::TypeMismatch {
            message: format!("'in <string>' requires a string, not {}", type_name(other)),
        }),
        (Value::Array(items), _) => Ok(items.iter().any(|candidate| values_equal(candidate, item))),
        (Value::Object(map), Value::String(key)) => Ok(map.contains_key(key)),
        (Value::Object(_), _) => Ok(false),
        (other, _) => Err(ConditionError::TypeMismatch {
            message: format!("argument of type {} is not iterable", type_name(other)),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "None",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
