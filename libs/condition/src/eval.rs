//! In-memory evaluation of constraints against flat JSON records.
//!
//! Missing fields satisfy `$ne`, `$nin` and `$exists: false` only. Numbers
//! compare numerically regardless of integer/float representation.

use crate::{Constraint, Operator};
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub(crate) fn matches_constraint(constraint: &Constraint, record: &Map<String, Value>) -> bool {
    let actual = record.get(&constraint.field);
    let expected = &constraint.value;

    match constraint.operator {
        Operator::Eq => actual.is_some_and(|a| values_equal(a, expected)),
        Operator::Ne => !actual.is_some_and(|a| values_equal(a, expected)),
        Operator::In => actual.is_some_and(|a| contains(expected, a)),
        Operator::Nin => !actual.is_some_and(|a| contains(expected, a)),
        Operator::Lt => ordering(actual, expected).is_some_and(|o| o == Ordering::Less),
        Operator::Lte => ordering(actual, expected).is_some_and(|o| o != Ordering::Greater),
        Operator::Gt => ordering(actual, expected).is_some_and(|o| o == Ordering::Greater),
        Operator::Gte => ordering(actual, expected).is_some_and(|o| o != Ordering::Less),
        Operator::Regex => match (actual.and_then(Value::as_str), expected.as_str()) {
            (Some(text), Some(pattern)) => regex::Regex::new(pattern)
                .map(|re| re.is_match(text))
                .unwrap_or(false),
            _ => false,
        },
        Operator::Exists => actual.is_some() == expected.as_bool().unwrap_or(true),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn contains(options: &Value, actual: &Value) -> bool {
    options
        .as_array()
        .is_some_and(|items| items.iter().any(|item| values_equal(actual, item)))
}

fn ordering(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    match (actual?, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}
