// args.rs — Block argument validation and rendering
//
// Decides which argument params are emitted (user value set, truthy, and
// different from the library default) and coerces each emitted value to a
// literal of its declared kind.
//
// Preconditions: none.
// Postconditions: every returned `RenderedArg` has an identifier name and a
//                 literal value valid in the declaration language.
// Failure modes: uncoercible value, unsupported kind (string, array, unknown)
//                → `Diagnostic` with path `[block, arg]`.
// Side effects: none.

use std::fmt;

use serde_json::{Number, Value};

use crate::diag::{codes, DiagCode, Diagnostic};
use crate::graph::{ArgKind, ArgParam, Node};
use crate::ident::is_identifier;

/// One `name=value` keyword argument of a block instantiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArg {
    pub name: String,
    pub value: String,
}

impl fmt::Display for RenderedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Render the explicit arguments of `node`, in declaration order.
pub fn render_args(node: &Node) -> Result<Vec<RenderedArg>, Diagnostic> {
    let mut rendered = Vec::new();
    for arg in &node.args {
        if !should_emit(arg) {
            continue;
        }
        let Some(value) = &arg.value else {
            continue;
        };
        let path = [node.name.as_str(), arg.name.as_str()];
        if !is_identifier(&arg.name) {
            return Err(Diagnostic::new(codes::E0104, path, "invalid argument name"));
        }
        let literal = coerce(arg, value)
            .map_err(|(code, message)| {
                Diagnostic::new(code, path, message).with_constraint(arg.kind.to_string())
            })?;
        rendered.push(RenderedArg {
            name: arg.name.clone(),
            value: literal,
        });
    }
    Ok(rendered)
}

/// A param is emitted only when the user set a truthy value that differs
/// from the library default.
pub fn should_emit(arg: &ArgParam) -> bool {
    let value = non_null(arg.value.as_ref());
    let Some(value) = value else {
        return false;
    };
    is_truthy(value) && !values_equal(non_null(arg.default.as_ref()), Some(value))
}

fn non_null(v: Option<&Value>) -> Option<&Value> {
    v.filter(|v| !v.is_null())
}

/// Falsy: null, false, zero, empty string / list / object.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Value equality where numbers compare by magnitude (`1 == 1.0`) and
/// booleans count as `0` and `1`.
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(Value::Number(x)), Some(Value::Number(y))) => numbers_equal(x, y),
        (Some(Value::Bool(b)), Some(Value::Number(n)))
        | (Some(Value::Number(n)), Some(Value::Bool(b))) => {
            numbers_equal(n, &Number::from(u8::from(*b)))
        }
        (Some(Value::Array(xs)), Some(Value::Array(ys))) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| values_equal(Some(x), Some(y)))
        }
        (Some(Value::Object(xs)), Some(Value::Object(ys))) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| values_equal(Some(x), ys.get(k)))
        }
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(i), Some(j)) = (x.as_i64(), y.as_i64()) {
        return i == j;
    }
    if let (Some(i), Some(j)) = (x.as_u64(), y.as_u64()) {
        return i == j;
    }
    x.as_f64() == y.as_f64()
}

fn coerce(arg: &ArgParam, value: &Value) -> Result<String, (DiagCode, String)> {
    match &arg.kind {
        ArgKind::Int => coerce_int(value)
            .map(|i| i.to_string())
            .ok_or_else(|| (codes::E0200, format!("invalid non-int value {}", value))),
        ArgKind::Float => coerce_float(value)
            .map(format_float)
            .ok_or_else(|| (codes::E0201, format!("invalid non-float value {}", value))),
        ArgKind::Range => {
            let bounds = match value {
                Value::Array(items) if items.len() == 2 => {
                    coerce_float(&items[0]).zip(coerce_float(&items[1]))
                }
                _ => None,
            };
            bounds
                .map(|(lo, hi)| format!("({}, {})", format_float(lo), format_float(hi)))
                .ok_or_else(|| (codes::E0202, format!("invalid range value {}", value)))
        }
        ArgKind::String => Err((
            codes::E0203,
            "string arguments are not supported".to_string(),
        )),
        ArgKind::Array => Err((
            codes::E0204,
            "array arguments are not supported".to_string(),
        )),
        ArgKind::Unknown(kind) => Err((codes::E0205, format!("unknown argument type {}", kind))),
    }
}

fn coerce_int(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| {
                // Non-integral numbers truncate toward zero.
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i128::MAX as f64)
                    .map(|f| f.trunc() as i128)
            }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(true) => Some(1),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    f.is_finite().then_some(f)
}

/// Shortest round-trip float literal: `1.0`, `3.135`, `1e+16`, `1.5e-05`.
pub fn format_float(f: f64) -> String {
    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let s = format!("{:e}", f);
        match s.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            None => s,
        }
    } else if f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}
