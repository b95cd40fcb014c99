// File: src/coerce.rs
// Purpose: Literal token to typed value conversion

use crate::error::ExpandError;
use crate::value::Value;

/// Convert a literal token to its typed value: the keywords `true` and
/// `false`, a string wrapped in matching single or double quotes, or a
/// number. The token is trimmed first; nothing else is implicit.
///
/// The numeric parse is strict full-string parsing, so `3abc` fails
/// here rather than truncating to 3.
pub fn coerce_literal(token: &str) -> Result<Value, ExpandError> {
    let t = token.trim();
    match t {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if t.len() >= 2 {
        let quoted = (t.starts_with('\'') && t.ends_with('\''))
            || (t.starts_with('"') && t.ends_with('"'));
        if quoted {
            return Ok(Value::String(t[1..t.len() - 1].to_string()));
        }
    }
    match t.parse::<f64>() {
        Ok(n) if !n.is_nan() => Ok(Value::Number(n)),
        _ => Err(ExpandError::InvalidPrimitiveLiteral(token.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerces_keywords_strings_and_numbers() {
        let cases = [
            ("true", Value::Bool(true)),
            ("  false ", Value::Bool(false)),
            ("'hi'", Value::String("hi".into())),
            ("\"hi\"", Value::String("hi".into())),
            ("''", Value::String(String::new())),
            ("'true'", Value::String("true".into())),
            ("3", Value::Number(3.0)),
            ("2.5", Value::Number(2.5)),
            ("-4", Value::Number(-4.0)),
            ("1e3", Value::Number(1000.0)),
            (".5", Value::Number(0.5)),
        ];
        for (token, expected) in cases {
            assert_eq!(coerce_literal(token).unwrap(), expected, "token {token:?}");
        }
    }

    #[test]
    fn test_rejects_everything_else() {
        for token in ["abc", "3abc", "", "'", "'mixed\"", "nan"] {
            assert!(
                matches!(
                    coerce_literal(token),
                    Err(ExpandError::InvalidPrimitiveLiteral(_))
                ),
                "accepted {token:?}"
            );
        }
    }
}
