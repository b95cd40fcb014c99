// File: src/cond.rs
// Purpose: Restricted boolean condition evaluation

use crate::coerce::coerce_literal;
use crate::error::ExpandError;
use crate::path::{self, unwrap_braces};
use crate::value::{Context, Value};
use std::cmp::Ordering;

/// Characters with no meaning in the condition grammar. Their presence
/// anywhere in the raw text, even inside a `{{ }}` reference, is
/// rejected outright, which keeps arithmetic, negation, grouping and
/// nested member access out of conditions.
const FORBIDDEN_CHARS: &[char] = &['!', '(', ')', '[', ']', '.', '+', '-', '*', '/'];

/// Comparison operators in scan priority order: multi-character
/// operators come first so `>=` is never split as `>` plus `=`. The
/// `!` forms take part in the scan but are unreachable from template
/// conditions, which reject `!` wholesale.
const OPERATORS: &[(&str, CompareOp)] = &[
    ("===", CompareOp::StrictEq),
    ("!==", CompareOp::StrictNe),
    ("==", CompareOp::LooseEq),
    ("!=", CompareOp::LooseNe),
    (">=", CompareOp::Ge),
    ("<=", CompareOp::Le),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum CompareOp {
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Ge,
    Le,
    Gt,
    Lt,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    And,
    Or,
}

/// Evaluate a condition string: one or more atomic comparisons joined
/// by `&&`/`||`.
///
/// Combinators carry no relative precedence. The collected booleans
/// fold strictly left to right, so `a && b || c` is `(a && b) || c`,
/// never `a && (b || c)`. Every atom is evaluated eagerly during the
/// scan; a resolution error in a later atom aborts even when the fold
/// could have short-circuited.
pub fn evaluate(cond: &str, ctx: &Context) -> Result<bool, ExpandError> {
    check_syntax(cond)?;

    let mut terms = Vec::new();
    let mut combinators = Vec::new();
    let mut rest = cond;
    while let Some((at, comb)) = find_combinator(rest) {
        terms.push(eval_comparison(rest[..at].trim(), ctx)?);
        combinators.push(comb);
        rest = &rest[at + 2..];
    }
    terms.push(eval_comparison(rest.trim(), ctx)?);

    let mut acc = terms[0];
    for (comb, term) in combinators.iter().zip(&terms[1..]) {
        acc = match comb {
            Combinator::And => acc && *term,
            Combinator::Or => acc || *term,
        };
    }
    tracing::trace!(cond, result = acc, "evaluated condition");
    Ok(acc)
}

/// Reject forbidden characters without resolving anything. This is the
/// static half of `evaluate`, usable on its own for template linting.
pub fn check_syntax(cond: &str) -> Result<(), ExpandError> {
    for ch in FORBIDDEN_CHARS {
        if cond.contains(*ch) {
            return Err(ExpandError::MalformedAccessor(format!(
                "condition {cond:?} contains forbidden character {ch:?}"
            )));
        }
    }
    Ok(())
}

/// First `&&` or `||` in the string, by adjacent-character pairs.
fn find_combinator(s: &str) -> Option<(usize, Combinator)> {
    let bytes = s.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        match (bytes[i], bytes[i + 1]) {
            (b'&', b'&') => return Some((i, Combinator::And)),
            (b'|', b'|') => return Some((i, Combinator::Or)),
            _ => {}
        }
    }
    None
}

fn eval_comparison(text: &str, ctx: &Context) -> Result<bool, ExpandError> {
    let found = OPERATORS
        .iter()
        .find_map(|(symbol, op)| text.find(symbol).map(|at| (at, symbol.len(), *op)));

    match found {
        Some((at, width, op)) => {
            let left = resolve_side(text[..at].trim(), ctx)?;
            let right = resolve_side(text[at + width..].trim(), ctx)?;
            Ok(compare(op, &left, &right))
        }
        None => Ok(resolve_side(text, ctx)?.is_truthy()),
    }
}

fn resolve_side(token: &str, ctx: &Context) -> Result<Value, ExpandError> {
    match unwrap_braces(token) {
        Some(inner) => path::resolve(inner.trim(), ctx),
        None => coerce_literal(token),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::StrictEq => left == right,
        CompareOp::StrictNe => left != right,
        CompareOp::LooseEq => loose_eq(left, right),
        CompareOp::LooseNe => !loose_eq(left, right),
        CompareOp::Ge => matches!(order(left, right), Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::Le => matches!(order(left, right), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => matches!(order(left, right), Some(Ordering::Greater)),
        CompareOp::Lt => matches!(order(left, right), Some(Ordering::Less)),
    }
}

/// Host-style loose equality: numbers, strings and booleans
/// cross-coerce numerically, `Null` equals only `Null`, collections
/// fall back to structural equality.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(b)) => a == b,
        (
            Value::Number(_) | Value::Bool(_) | Value::String(_),
            Value::Number(_) | Value::Bool(_) | Value::String(_),
        ) => match (to_number(left), to_number(right)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        _ => left == right,
    }
}

/// Host-style ordering: two strings compare lexicographically, anything
/// else coerces numerically. Incomparable pairs make every ordering
/// operator false rather than an error.
fn order(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Some(a.cmp(b));
    }
    to_number(left)?.partial_cmp(&to_number(right)?)
}

/// Numeric coercion for loose comparison: booleans are 0/1, `Null` is
/// 0, strings parse (empty is 0), collections and callables never
/// coerce.
fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                Some(0.0)
            } else {
                t.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> Context {
        let mut ctx = Context::new();
        ctx.set("a", Value::Number(4.0));
        ctx.set("b", Value::Number(3.0));
        ctx.set("c", Value::Number(1.0));
        ctx.set("n", Value::Number(5.0));
        ctx.set("nine", Value::Number(9.0));
        ctx.set("zero", Value::Number(0.0));
        ctx.set("name", "Ada");
        ctx.set("items", Value::List(vec![]));
        ctx.set("missing", Value::Null);
        ctx
    }

    #[test]
    fn test_left_to_right_fold_without_precedence() {
        // (4>3 && 3<2) || 1==1: the failed && does not win over the
        // trailing ||, and && does not bind tighter either.
        let ctx = sample_context();
        assert!(evaluate("{{a}}>3 && {{b}}<2 || {{c}}==1", &ctx).unwrap());
        // (3<2 && 4>3) || 1==1 folds F, then T.
        assert!(evaluate("{{b}}<2 && {{a}}>3 || {{c}}==1", &ctx).unwrap());
        // (4>3 || 1==1) && 3<2 folds T, then F.
        assert!(!evaluate("{{a}}>3 || {{c}}==1 && {{b}}<2", &ctx).unwrap());
    }

    #[test]
    fn test_chained_ands() {
        let ctx = sample_context();
        assert!(evaluate("{{a}}>3 && {{b}}>1 && {{c}}==1", &ctx).unwrap());
        assert!(!evaluate("{{a}}>3 && {{b}}>5 && {{c}}==1", &ctx).unwrap());
    }

    #[test]
    fn test_forbidden_characters() {
        let ctx = sample_context();
        let conds = [
            "{{a}} != 3",
            "!{{a}}",
            "{{char.height}} > 3",
            "({{a}} > 3)",
            "{{letters[0]}} == 'a'",
            "{{a}} + 1 > 3",
            "{{a}} > 3 - 1",
            "{{a}} * 2 > 3",
            "{{a}} / 2 > 3",
        ];
        for cond in conds {
            assert!(
                matches!(evaluate(cond, &ctx), Err(ExpandError::MalformedAccessor(_))),
                "accepted {cond:?}"
            );
        }
    }

    #[test]
    fn test_comma_is_not_forbidden() {
        let ctx = sample_context();
        assert!(!evaluate("{{name}} == 'a,b'", &ctx).unwrap());
    }

    #[test]
    fn test_bare_value_truthiness() {
        let ctx = sample_context();
        assert!(evaluate("{{name}}", &ctx).unwrap());
        assert!(evaluate("true", &ctx).unwrap());
        assert!(!evaluate("{{zero}}", &ctx).unwrap());
        assert!(!evaluate("{{missing}}", &ctx).unwrap());
        // Collections are truthy even when empty.
        assert!(evaluate("{{items}}", &ctx).unwrap());
    }

    #[test]
    fn test_loose_vs_strict_equality() {
        let ctx = sample_context();
        assert!(evaluate("{{n}} == '5'", &ctx).unwrap());
        assert!(!evaluate("{{n}} === '5'", &ctx).unwrap());
        assert!(evaluate("{{n}} === 5", &ctx).unwrap());
    }

    #[test]
    fn test_ordering() {
        let ctx = sample_context();
        assert!(evaluate("{{n}} >= 5", &ctx).unwrap());
        assert!(evaluate("{{n}} <= 5", &ctx).unwrap());
        assert!(!evaluate("{{n}} < 5", &ctx).unwrap());
        // Two strings compare lexicographically.
        assert!(evaluate("{{name}} < 'b'", &ctx).unwrap());
        // A string against a number compares numerically.
        assert!(evaluate("'10' > {{nine}}", &ctx).unwrap());
        // Null coerces to 0 for ordering.
        assert!(evaluate("{{missing}} >= 0", &ctx).unwrap());
        // Unparseable strings are incomparable, never an error.
        assert!(!evaluate("{{name}} > 3", &ctx).unwrap());
    }

    #[test]
    fn test_operator_priority_keeps_multichar_operators_whole() {
        let ctx = sample_context();
        // `>=` must not be split into `>` and a dangling `= 5`.
        assert!(evaluate("{{n}} >= 5", &ctx).unwrap());
        assert!(evaluate("{{n}} <= 9", &ctx).unwrap());
    }

    #[test]
    fn test_atoms_evaluate_eagerly() {
        // A later atom's failure aborts even though the fold would
        // already be decided.
        let ctx = sample_context();
        assert!(matches!(
            evaluate("{{a}}>3 || {{ghost}}==1", &ctx),
            Err(ExpandError::UndefinedVariable(_))
        ));
    }

    #[test]
    fn test_empty_side_fails_coercion() {
        let ctx = sample_context();
        assert!(matches!(
            evaluate("== 5", &ctx),
            Err(ExpandError::InvalidPrimitiveLiteral(_))
        ));
    }

    #[test]
    fn test_string_equality_is_not_numeric() {
        let mut ctx = sample_context();
        ctx.set("left", "abc");
        ctx.set("right", "abc");
        assert!(evaluate("{{left}} == {{right}}", &ctx).unwrap());
        assert!(!evaluate("{{left}} == 'abd'", &ctx).unwrap());
    }
}
