//! Guard expression evaluation.
//!
//! The chart never interprets expressions itself. It hands the expression text and
//! a read-only view of the property store to an [`ExpressionEvaluator`], which hosts
//! can replace with their own language. [`ComparisonEvaluator`] is the default and
//! covers the usual game-logic checks (`poison_count > 0 && !stunned`).

use crate::error::GuardError;
use crate::property::{PropertyStore, Scalar};
use std::cmp::Ordering;

/// Evaluates a guard expression against the current properties.
pub trait ExpressionEvaluator: Send + Sync {
    /// Returns whether the expression holds. Errors are reported by the chart and
    /// count as a failing guard.
    fn evaluate(&self, expression: &str, properties: &PropertyStore) -> Result<bool, GuardError>;
}

impl<F> ExpressionEvaluator for F
where
    F: Fn(&str, &PropertyStore) -> Result<bool, GuardError> + Send + Sync,
{
    fn evaluate(&self, expression: &str, properties: &PropertyStore) -> Result<bool, GuardError> {
        self(expression, properties)
    }
}

/// Small comparison language.
///
/// Terms are `true`, `false`, a property name (truthiness), `!term`, or
/// `operand OP operand` with `OP` one of `== != < <= > >=`. Operands are property
/// names, numbers, booleans or quoted strings. Terms combine with `&&` and `||`,
/// `&&` binding tighter. There are no parentheses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonEvaluator;

impl ExpressionEvaluator for ComparisonEvaluator {
    fn evaluate(&self, expression: &str, properties: &PropertyStore) -> Result<bool, GuardError> {
        if expression.trim().is_empty() {
            return Err(GuardError::Syntax("empty expression".to_string()));
        }
        for alternative in split_outside_quotes(expression, "||") {
            let mut all = true;
            for term in split_outside_quotes(alternative, "&&") {
                // keep evaluating so errors in later terms still surface
                if !eval_term(term, properties)? {
                    all = false;
                }
            }
            if all {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

fn eval_term(term: &str, properties: &PropertyStore) -> Result<bool, GuardError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(GuardError::Syntax("missing operand".to_string()));
    }

    if let Some((pos, len, op)) = find_operator(term) {
        let (lhs, rhs) = (&term[..pos], &term[pos + len..]);
        let left = operand(lhs, properties)?;
        let right = operand(rhs, properties)?;
        return compare(op, &left, &right, lhs.trim(), rhs.trim());
    }

    if let Some(rest) = term.strip_prefix('!') {
        return eval_term(rest, properties).map(|b| !b);
    }

    Ok(operand(term, properties)?.is_truthy())
}

fn compare(op: Op, left: &Scalar, right: &Scalar, lhs: &str, rhs: &str) -> Result<bool, GuardError> {
    let ordering = match (left, right) {
        (Scalar::Number(a), Scalar::Number(b)) => a.partial_cmp(b),
        (Scalar::Str(a), Scalar::Str(b)) => Some(a.cmp(b)),
        (Scalar::Bool(a), Scalar::Bool(b)) if matches!(op, Op::Eq | Op::Ne) => Some(a.cmp(b)),
        _ if matches!(op, Op::Eq) => return Ok(false),
        _ if matches!(op, Op::Ne) => return Ok(true),
        _ => {
            return Err(GuardError::TypeMismatch {
                left: format!("{lhs} ({})", left.type_name()),
                right: format!("{rhs} ({})", right.type_name()),
            })
        }
    };

    // NaN compares unequal to everything
    let Some(ordering) = ordering else {
        return Ok(matches!(op, Op::Ne));
    };

    Ok(match op {
        Op::Eq => ordering == Ordering::Equal,
        Op::Ne => ordering != Ordering::Equal,
        Op::Lt => ordering == Ordering::Less,
        Op::Le => ordering != Ordering::Greater,
        Op::Gt => ordering == Ordering::Greater,
        Op::Ge => ordering != Ordering::Less,
    })
}

fn operand(raw: &str, properties: &PropertyStore) -> Result<Scalar, GuardError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(GuardError::Syntax("missing operand".to_string()));
    }

    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Ok(Scalar::Str(raw[1..raw.len() - 1].to_string()));
        }
    }

    match raw {
        "true" => return Ok(Scalar::Bool(true)),
        "false" => return Ok(Scalar::Bool(false)),
        _ => {}
    }

    // identifiers win over float keywords such as `inf` and `nan`
    let is_identifier = raw
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && raw.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if is_identifier {
        return properties
            .get(raw)
            .cloned()
            .ok_or_else(|| GuardError::UnknownProperty(raw.to_string()));
    }

    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Scalar::Number(n)),
        _ => Err(GuardError::Syntax(format!("unexpected {raw:?}"))),
    }
}

/// Finds the first comparison operator outside of quotes.
fn find_operator(term: &str) -> Option<(usize, usize, Op)> {
    let bytes = term.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == b'"' || c == b'\'' => quote = Some(c),
            None => {
                let next = bytes.get(i + 1).copied();
                let two = match (c, next) {
                    (b'=', Some(b'=')) => Some(Op::Eq),
                    (b'!', Some(b'=')) => Some(Op::Ne),
                    (b'<', Some(b'=')) => Some(Op::Le),
                    (b'>', Some(b'=')) => Some(Op::Ge),
                    _ => None,
                };
                if let Some(op) = two {
                    return Some((i, 2, op));
                }
                match c {
                    b'<' => return Some((i, 1, Op::Lt)),
                    b'>' => return Some((i, 1, Op::Gt)),
                    _ => {}
                }
            }
        }
        i += 1;
    }
    None
}

fn split_outside_quotes<'a>(input: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut iter = input.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if input[i..].starts_with(separator) => {
                parts.push(&input[start..i]);
                start = i + separator.len();
                // skip the rest of the separator
                for _ in 1..separator.chars().count() {
                    iter.next();
                }
            }
            None => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PropertyStore {
        let mut store = PropertyStore::new();
        store.set("poison_count", 3);
        store.set("stunned", false);
        store.set("name", "hero");
        store
    }

    fn eval(expr: &str) -> Result<bool, GuardError> {
        ComparisonEvaluator.evaluate(expr, &store())
    }

    #[test]
    fn numeric_comparisons() {
        assert_eq!(eval("poison_count > 0"), Ok(true));
        assert_eq!(eval("poison_count >= 3"), Ok(true));
        assert_eq!(eval("poison_count < 3"), Ok(false));
        assert_eq!(eval("poison_count <= 2.5"), Ok(false));
        assert_eq!(eval("poison_count == 3"), Ok(true));
        assert_eq!(eval("poison_count != 3"), Ok(false));
    }

    #[test]
    fn literals_truthiness_and_negation() {
        assert_eq!(eval("true"), Ok(true));
        assert_eq!(eval("false"), Ok(false));
        assert_eq!(eval("poison_count"), Ok(true));
        assert_eq!(eval("!stunned"), Ok(true));
        assert_eq!(eval("!!stunned"), Ok(false));
    }

    #[test]
    fn strings_compare_and_may_contain_operators() {
        assert_eq!(eval("name == 'hero'"), Ok(true));
        assert_eq!(eval("name == \"a || b\""), Ok(false));
        assert_eq!(eval("name != 'villain'"), Ok(true));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(eval("stunned && poison_count > 0 || name == 'hero'"), Ok(true));
        assert_eq!(eval("stunned || poison_count > 5 && true"), Ok(false));
        assert_eq!(eval("poison_count > 0 && !stunned"), Ok(true));
    }

    #[test]
    fn mixed_types() {
        assert_eq!(eval("name == 3"), Ok(false));
        assert_eq!(eval("name != 3"), Ok(true));
        assert!(matches!(
            eval("name > 3"),
            Err(GuardError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn errors() {
        assert_eq!(
            eval("mana > 0"),
            Err(GuardError::UnknownProperty("mana".to_string()))
        );
        assert!(matches!(eval(""), Err(GuardError::Syntax(_))));
        assert!(matches!(eval("poison_count >"), Err(GuardError::Syntax(_))));
        assert!(matches!(eval("a = 1"), Err(GuardError::Syntax(_))));
    }

    #[test]
    fn float_keywords_are_property_names() {
        let mut store = store();
        store.set("inf", 2);
        store.set("nan", true);
        assert_eq!(ComparisonEvaluator.evaluate("inf == 2", &store), Ok(true));
        assert_eq!(ComparisonEvaluator.evaluate("nan", &store), Ok(true));
        assert_eq!(
            eval("infinity > 0"),
            Err(GuardError::UnknownProperty("infinity".to_string()))
        );
        assert!(matches!(eval("poison_count < -inf"), Err(GuardError::Syntax(_))));
        assert_eq!(eval("poison_count > -1.5e1"), Ok(true));
    }

    #[test]
    fn closures_are_evaluators() {
        let always = |_: &str, _: &PropertyStore| -> Result<bool, GuardError> { Ok(true) };
        assert_eq!(always.evaluate("anything", &store()), Ok(true));
    }
}
