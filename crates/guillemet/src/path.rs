// File: src/path.rs
// Purpose: Accessor path resolution against the data context

use crate::coerce::coerce_literal;
use crate::error::ExpandError;
use crate::value::{Context, Value};
use std::collections::HashMap;

/// Resolve an accessor path against the context.
///
/// Exactly one form applies per call, checked in this order: dotted
/// member access (`char.height`), bracket index or key access
/// (`letters[0]`, `char["weight"]`), call syntax (`sum(1, {{a}})`),
/// direct key. Recursion reaches the other forms, so `char.stats[0]`
/// resolves `stats[0]` against the mapping `char`.
pub fn resolve(path: &str, ctx: &Context) -> Result<Value, ExpandError> {
    resolve_in(path.trim(), ctx.vars())
}

pub(crate) fn resolve_in(
    path: &str,
    vars: &HashMap<String, Value>,
) -> Result<Value, ExpandError> {
    if let Some((left, rest)) = path.split_once('.') {
        return resolve_member(left, rest, vars);
    }
    if path.contains('[') {
        return resolve_index(path, vars);
    }
    if path.contains('(') {
        return resolve_call(path, vars);
    }
    match vars.get(path) {
        Some(value) => Ok(value.clone()),
        None => Err(ExpandError::UndefinedVariable(path.to_string())),
    }
}

/// Strip a `{{ ... }}` wrapper, if the whole token is wrapped.
pub(crate) fn unwrap_braces(token: &str) -> Option<&str> {
    token.strip_prefix("{{")?.strip_suffix("}}")
}

fn resolve_member(
    left: &str,
    rest: &str,
    vars: &HashMap<String, Value>,
) -> Result<Value, ExpandError> {
    match vars.get(left) {
        None => Err(ExpandError::UndefinedVariable(left.to_string())),
        Some(Value::Map(inner)) => resolve_in(rest, inner),
        Some(_) => Err(ExpandError::TypeMismatch {
            name: left.to_string(),
            expected: "a mapping",
        }),
    }
}

fn resolve_index(path: &str, vars: &HashMap<String, Value>) -> Result<Value, ExpandError> {
    let Some((name, bracket)) = path.split_once('[') else {
        return Err(ExpandError::MalformedAccessor(format!(
            "expected '[' in {path:?}"
        )));
    };
    // Text after the first ']' is ignored.
    let Some((token, _)) = bracket.split_once(']') else {
        return Err(ExpandError::MalformedAccessor(format!(
            "missing closing ']' in {path:?}"
        )));
    };

    let token = token.trim();
    if token.len() >= 2 {
        let quoted = (token.starts_with('\'') && token.ends_with('\''))
            || (token.starts_with('"') && token.ends_with('"'));
        if quoted {
            let key = &token[1..token.len() - 1];
            return match vars.get(name) {
                None => Err(ExpandError::UndefinedVariable(name.to_string())),
                Some(Value::Map(inner)) => match inner.get(key) {
                    Some(value) => Ok(value.clone()),
                    None => Err(ExpandError::UndefinedVariable(format!("{name}[{key:?}]"))),
                },
                Some(_) => Err(ExpandError::TypeMismatch {
                    name: name.to_string(),
                    expected: "a mapping",
                }),
            };
        }
    }

    let index: i64 = match token.parse() {
        Ok(i) => i,
        Err(_) => {
            return Err(ExpandError::MalformedAccessor(format!(
                "index {token:?} in {path:?} is neither an integer nor a quoted key"
            )))
        }
    };
    let base = match vars.get(name) {
        Some(base) => base,
        None => return Err(ExpandError::UndefinedVariable(name.to_string())),
    };
    match base {
        Value::List(items) => {
            let i = checked_index(index, items.len(), name)?;
            Ok(items[i].clone())
        }
        Value::String(s) => {
            let len = s.chars().count();
            let i = checked_index(index, len, name)?;
            match s.chars().nth(i) {
                Some(ch) => Ok(Value::String(ch.to_string())),
                None => Err(ExpandError::IndexOutOfRange {
                    name: name.to_string(),
                    index,
                    len,
                }),
            }
        }
        _ => Err(ExpandError::TypeMismatch {
            name: name.to_string(),
            expected: "a sequence or string",
        }),
    }
}

fn checked_index(index: i64, len: usize, name: &str) -> Result<usize, ExpandError> {
    if index >= 0 && (index as usize) < len {
        Ok(index as usize)
    } else {
        Err(ExpandError::IndexOutOfRange {
            name: name.to_string(),
            index,
            len,
        })
    }
}

fn resolve_call(path: &str, vars: &HashMap<String, Value>) -> Result<Value, ExpandError> {
    let Some((name, rest)) = path.split_once('(') else {
        return Err(ExpandError::MalformedAccessor(format!(
            "expected '(' in {path:?}"
        )));
    };
    // Text after the first ')' is ignored.
    let Some((args_str, _)) = rest.split_once(')') else {
        return Err(ExpandError::MalformedAccessor(format!(
            "missing closing ')' in {path:?}"
        )));
    };

    let target = match vars.get(name) {
        Some(target) => target,
        None => return Err(ExpandError::UndefinedVariable(name.to_string())),
    };
    let Value::Callable(f) = target else {
        return Err(ExpandError::NotAFunction(name.to_string()));
    };

    // Arguments evaluate left to right; the first failure aborts.
    let mut args = Vec::new();
    for raw in args_str.split(',') {
        let arg = raw.trim();
        match unwrap_braces(arg) {
            Some(inner) => args.push(resolve_in(inner.trim(), vars)?),
            None => args.push(coerce_literal(arg)?),
        }
    }
    f.call(&args)
}
