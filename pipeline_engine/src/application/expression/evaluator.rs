// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Tree-walking evaluator for the expression AST (spec.md §4.7): JS-like
//! truthiness, strict/loose equality, a whitelisted method set on strings,
//! arrays and numbers, and a frozen `Math` sandbox exposing only `Math.PI`
//! and `Math.E`.

use serde_json::{Map, Value};

use super::ast::{BinaryOp, Expr, UnaryOp};

pub type EvalResult = Result<Value, String>;

/// Evaluates `expr` against `context` (the record plus any extra bindings
/// the caller merges in, e.g. `record`/`args`/`cpData` per operator).
pub fn eval(expr: &Expr, context: &Map<String, Value>) -> EvalResult {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(json_number(*n)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Array(items) => {
            let values = items.iter().map(|item| eval(item, context)).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(values))
        }
        Expr::Path(segments) => Ok(resolve_path(segments, context)),
        Expr::Unary { op, expr } => eval_unary(*op, expr, context),
        Expr::Binary { op, left, right } => eval_binary(*op, left, right, context),
        Expr::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            if is_truthy(&eval(cond, context)?) {
                eval(then_branch, context)
            } else {
                eval(else_branch, context)
            }
        }
        Expr::MethodCall { receiver, method, args } => eval_method_call(receiver, method, args, context),
        Expr::Arrow { .. } => Err("arrow functions may only appear as method arguments".to_string()),
    }
}

fn resolve_path(segments: &[String], context: &Map<String, Value>) -> Value {
    if segments.first().map(String::as_str) == Some("Math") {
        return match segments.get(1).map(String::as_str) {
            Some("PI") => json_number(std::f64::consts::PI),
            Some("E") => json_number(std::f64::consts::E),
            _ => Value::Null,
        };
    }
    let Some((first, rest)) = segments.split_first() else {
        return Value::Null;
    };
    let mut current = match context.get(first) {
        Some(v) => v.clone(),
        None => return Value::Null,
    };
    for key in rest {
        current = match current {
            Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        };
    }
    current
}

fn eval_unary(op: UnaryOp, expr: &Expr, context: &Map<String, Value>) -> EvalResult {
    let value = eval(expr, context)?;
    match op {
        UnaryOp::Not => Ok(Value::Bool(!is_truthy(&value))),
        UnaryOp::Neg => Ok(json_number(-as_number(&value))),
    }
}

fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr, context: &Map<String, Value>) -> EvalResult {
    // Short-circuiting operators evaluate their right side lazily.
    match op {
        BinaryOp::And => {
            let l = eval(left, context)?;
            return if !is_truthy(&l) { Ok(l) } else { eval(right, context) };
        }
        BinaryOp::Or => {
            let l = eval(left, context)?;
            return if is_truthy(&l) { Ok(l) } else { eval(right, context) };
        }
        BinaryOp::NullishCoalesce => {
            let l = eval(left, context)?;
            return if matches!(l, Value::Null) { eval(right, context) } else { Ok(l) };
        }
        _ => {}
    }

    let l = eval(left, context)?;
    let r = eval(right, context)?;
    match op {
        BinaryOp::Add => Ok(add(&l, &r)),
        BinaryOp::Sub => Ok(json_number(as_number(&l) - as_number(&r))),
        BinaryOp::Mul => Ok(json_number(as_number(&l) * as_number(&r))),
        BinaryOp::Div => Ok(json_number(as_number(&l) / as_number(&r))),
        BinaryOp::Mod => Ok(json_number(as_number(&l) % as_number(&r))),
        BinaryOp::StrictEq => Ok(Value::Bool(strict_eq(&l, &r))),
        BinaryOp::StrictNe => Ok(Value::Bool(!strict_eq(&l, &r))),
        BinaryOp::LooseEq => Ok(Value::Bool(loose_eq(&l, &r))),
        BinaryOp::LooseNe => Ok(Value::Bool(!loose_eq(&l, &r))),
        BinaryOp::Gt => Ok(Value::Bool(as_number(&l) > as_number(&r))),
        BinaryOp::Lt => Ok(Value::Bool(as_number(&l) < as_number(&r))),
        BinaryOp::Gte => Ok(Value::Bool(as_number(&l) >= as_number(&r))),
        BinaryOp::Lte => Ok(Value::Bool(as_number(&l) <= as_number(&r))),
        BinaryOp::And | BinaryOp::Or | BinaryOp::NullishCoalesce => unreachable!(),
    }
}

fn add(l: &Value, r: &Value) -> Value {
    if let (Value::String(_), _) | (_, Value::String(_)) = (l, r) {
        Value::String(format!("{}{}", as_display(l), as_display(r)))
    } else {
        json_number(as_number(l) + as_number(r))
    }
}

fn as_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn as_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        _ => f64::NAN,
    }
}

fn json_number(n: f64) -> Value {
    serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

fn strict_eq(l: &Value, r: &Value) -> bool {
    l == r
}

fn loose_eq(l: &Value, r: &Value) -> bool {
    if std::mem::discriminant(l) == std::mem::discriminant(r) {
        return strict_eq(l, r);
    }
    match (l, r) {
        (Value::Null, _) | (_, Value::Null) => matches!(l, Value::Null) && matches!(r, Value::Null),
        _ => as_number(l) == as_number(r),
    }
}

fn eval_method_call(receiver: &Expr, method: &str, args: &[Expr], context: &Map<String, Value>) -> EvalResult {
    let receiver_value = eval(receiver, context)?;
    match &receiver_value {
        Value::String(s) => eval_string_method(s, method, args, context),
        Value::Array(items) => eval_array_method(items, method, args, context, receiver),
        Value::Number(_) => eval_number_method(as_number(&receiver_value), method, args, context),
        _ => Err(format!("method '{method}' is not supported on this value")),
    }
}

fn arg_value(args: &[Expr], idx: usize, context: &Map<String, Value>) -> EvalResult {
    args.get(idx)
        .ok_or_else(|| format!("missing argument {idx}"))
        .and_then(|expr| eval(expr, context))
}

fn eval_string_method(s: &str, method: &str, args: &[Expr], context: &Map<String, Value>) -> EvalResult {
    match method {
        "toLowerCase" => Ok(Value::String(s.to_lowercase())),
        "toUpperCase" => Ok(Value::String(s.to_uppercase())),
        "trim" => Ok(Value::String(s.trim().to_string())),
        "length" => Ok(json_number(s.chars().count() as f64)),
        "charAt" => {
            let idx = arg_value(args, 0, context)? ;
            let idx = as_number(&idx) as usize;
            Ok(Value::String(s.chars().nth(idx).map(|c| c.to_string()).unwrap_or_default()))
        }
        "includes" => {
            let needle = arg_value(args, 0, context)?;
            Ok(Value::Bool(s.contains(&as_display(&needle))))
        }
        "startsWith" => {
            let needle = arg_value(args, 0, context)?;
            Ok(Value::Bool(s.starts_with(&as_display(&needle))))
        }
        "endsWith" => {
            let needle = arg_value(args, 0, context)?;
            Ok(Value::Bool(s.ends_with(&as_display(&needle))))
        }
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len() as i64;
            let start = normalize_index(as_number(&arg_value(args, 0, context)?) as i64, len);
            let end = if args.len() > 1 {
                normalize_index(as_number(&arg_value(args, 1, context)?) as i64, len)
            } else {
                len
            };
            let (start, end) = (start.min(len).max(0), end.min(len).max(0));
            if start >= end {
                Ok(Value::String(String::new()))
            } else {
                Ok(Value::String(chars[start as usize..end as usize].iter().collect()))
            }
        }
        "split" => {
            let sep = arg_value(args, 0, context)?;
            let sep = as_display(&sep);
            let parts: Vec<Value> = if sep.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(|p| Value::String(p.to_string())).collect()
            };
            Ok(Value::Array(parts))
        }
        "replace" => {
            let from = as_display(&arg_value(args, 0, context)?);
            let to = as_display(&arg_value(args, 1, context)?);
            Ok(Value::String(s.replacen(&from, &to, 1)))
        }
        other => Err(format!("string has no method '{other}'")),
    }
}

fn normalize_index(idx: i64, len: i64) -> i64 {
    if idx < 0 {
        (len + idx).max(0)
    } else {
        idx
    }
}

fn eval_number_method(n: f64, method: &str, args: &[Expr], context: &Map<String, Value>) -> EvalResult {
    match method {
        "toFixed" => {
            let decimals = if args.is_empty() {
                0
            } else {
                as_number(&arg_value(args, 0, context)?) as usize
            };
            Ok(Value::String(format!("{n:.decimals$}")))
        }
        other => Err(format!("number has no method '{other}'")),
    }
}

fn eval_array_method(
    items: &[Value],
    method: &str,
    args: &[Expr],
    context: &Map<String, Value>,
    _receiver_expr: &Expr,
) -> EvalResult {
    match method {
        "length" => Ok(json_number(items.len() as f64)),
        "includes" => {
            let needle = arg_value(args, 0, context)?;
            Ok(Value::Bool(items.iter().any(|item| strict_eq(item, &needle))))
        }
        "join" => {
            let sep = if args.is_empty() {
                ",".to_string()
            } else {
                as_display(&arg_value(args, 0, context)?)
            };
            let parts: Vec<String> = items.iter().map(as_display).collect();
            Ok(Value::String(parts.join(&sep)))
        }
        "slice" => {
            let len = items.len() as i64;
            let start = normalize_index(as_number(&arg_value(args, 0, context)?) as i64, len);
            let end = if args.len() > 1 {
                normalize_index(as_number(&arg_value(args, 1, context)?) as i64, len)
            } else {
                len
            };
            let (start, end) = (start.min(len).max(0), end.min(len).max(0));
            if start >= end {
                Ok(Value::Array(Vec::new()))
            } else {
                Ok(Value::Array(items[start as usize..end as usize].to_vec()))
            }
        }
        "map" => {
            let arrow = expect_arrow(args, 0)?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(call_arrow(arrow, item, context)?);
            }
            Ok(Value::Array(out))
        }
        "filter" => {
            let arrow = expect_arrow(args, 0)?;
            let mut out = Vec::new();
            for item in items {
                if is_truthy(&call_arrow(arrow, item, context)?) {
                    out.push(item.clone());
                }
            }
            Ok(Value::Array(out))
        }
        "find" => {
            let arrow = expect_arrow(args, 0)?;
            for item in items {
                if is_truthy(&call_arrow(arrow, item, context)?) {
                    return Ok(item.clone());
                }
            }
            Ok(Value::Null)
        }
        "some" => {
            let arrow = expect_arrow(args, 0)?;
            for item in items {
                if is_truthy(&call_arrow(arrow, item, context)?) {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        "every" => {
            let arrow = expect_arrow(args, 0)?;
            for item in items {
                if !is_truthy(&call_arrow(arrow, item, context)?) {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        "reduce" => {
            let arrow = expect_reduce_arrow(args, 0)?;
            let mut acc = if args.len() > 1 {
                eval(&args[1], context)?
            } else {
                items.first().cloned().ok_or_else(|| "reduce of empty array with no initial value".to_string())?
            };
            let skip = if args.len() > 1 { 0 } else { 1 };
            for item in items.iter().skip(skip) {
                acc = call_reduce_arrow(arrow, &acc, item, context)?;
            }
            Ok(acc)
        }
        other => Err(format!("array has no method '{other}'")),
    }
}

fn expect_arrow(args: &[Expr], idx: usize) -> Result<(&str, &Expr), String> {
    match args.get(idx) {
        Some(Expr::Arrow { params, body }) if params.len() == 1 => Ok((params[0].as_str(), body.as_ref())),
        _ => Err("expected a single-parameter arrow function argument".to_string()),
    }
}

fn expect_reduce_arrow(args: &[Expr], idx: usize) -> Result<(&str, &str, &Expr), String> {
    match args.get(idx) {
        Some(Expr::Arrow { params, body }) if params.len() == 2 => {
            Ok((params[0].as_str(), params[1].as_str(), body.as_ref()))
        }
        _ => Err("expected a two-parameter arrow function argument for reduce".to_string()),
    }
}

fn call_arrow(arrow: (&str, &Expr), item: &Value, context: &Map<String, Value>) -> EvalResult {
    let (param, body) = arrow;
    let mut scope = context.clone();
    scope.insert(param.to_string(), item.clone());
    eval(body, &scope)
}

fn call_reduce_arrow(arrow: (&str, &str, &Expr), acc: &Value, item: &Value, context: &Map<String, Value>) -> EvalResult {
    let (acc_param, item_param, body) = arrow;
    let mut scope = context.clone();
    scope.insert(acc_param.to_string(), acc.clone());
    scope.insert(item_param.to_string(), item.clone());
    eval(body, &scope)
}

#[cfg(test)]
mod tests {
    use super::super::parser::Parser;
    use super::*;

    fn ctx(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn run(src: &str, context: &Map<String, Value>) -> Value {
        let expr = Parser::parse(src).unwrap();
        eval(&expr, context).unwrap()
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(run("1 + 2 * 3", &ctx(&[])), json_number(7.0));
    }

    #[test]
    fn ternary_and_comparison() {
        let c = ctx(&[("price", json_number(25.0))]);
        assert_eq!(run("price > 10 ? \"high\" : \"low\"", &c), Value::String("high".to_string()));
    }

    #[test]
    fn strict_vs_loose_equality() {
        assert_eq!(run("1 === \"1\"", &ctx(&[])), Value::Bool(false));
        assert_eq!(run("1 == \"1\"", &ctx(&[])), Value::Bool(true));
    }

    #[test]
    fn nullish_coalescing() {
        assert_eq!(run("missing ?? \"fallback\"", &ctx(&[])), Value::String("fallback".to_string()));
    }

    #[test]
    fn string_methods_chain() {
        let c = ctx(&[("name", Value::String("  Ada  ".to_string()))]);
        assert_eq!(run("name.trim().toUpperCase()", &c), Value::String("ADA".to_string()));
    }

    #[test]
    fn array_map_filter_reduce() {
        let c = ctx(&[(
            "items",
            Value::Array(vec![json_number(1.0), json_number(2.0), json_number(3.0)]),
        )]);
        assert_eq!(
            run("items.map(x => x * 2).filter(x => x > 2).reduce((a, b) => a + b)", &c),
            json_number(10.0)
        );
    }

    #[test]
    fn math_constants_are_sandboxed() {
        assert_eq!(run("Math.PI", &ctx(&[])), json_number(std::f64::consts::PI));
    }

    #[test]
    fn dotted_path_resolves_nested_values() {
        let mut inner = Map::new();
        inner.insert("id".to_string(), json_number(42.0));
        let c = ctx(&[("order", Value::Object(inner))]);
        assert_eq!(run("order.id", &c), json_number(42.0));
    }
}
