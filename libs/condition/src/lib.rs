//! Structured filter conditions for CMDB instance queries.
//!
//! A [`Condition`] is an ordered, conjunctive list of `(field, operator, value)`
//! constraints. Callers hand in Mongo-style JSON filters:
//!
//! ```json
//! { "bk_biz_name": "payments", "bk_biz_id": { "$in": [3, 4] }, "life_cycle": { "$ne": "3" } }
//! ```
//!
//! which [`Condition::parse`] decomposes into constraints. Services then append
//! mandatory scoping with [`Condition::with_scope`]; because every constraint is
//! AND-ed, appended scoping can only narrow what caller input selects.
//!
//! Stores either render the constraints into their own query language (the
//! server renders SQL with bound parameters) or evaluate them directly with
//! [`Condition::matches`].

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

mod eval;

/// Comparison operator of a single constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    #[serde(rename = "$eq")]
    Eq,
    #[serde(rename = "$ne")]
    Ne,
    #[serde(rename = "$in")]
    In,
    #[serde(rename = "$nin")]
    Nin,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$regex")]
    Regex,
    #[serde(rename = "$exists")]
    Exists,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Regex => "$regex",
            Operator::Exists => "$exists",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(Operator::Eq),
            "$ne" => Some(Operator::Ne),
            "$in" => Some(Operator::In),
            "$nin" => Some(Operator::Nin),
            "$lt" => Some(Operator::Lt),
            "$lte" => Some(Operator::Lte),
            "$gt" => Some(Operator::Gt),
            "$gte" => Some(Operator::Gte),
            "$regex" => Some(Operator::Regex),
            "$exists" => Some(Operator::Exists),
            _ => None,
        }
    }

    /// Check that `operand` has the JSON shape this operator works on.
    fn accepts(&self, operand: &Value) -> Result<(), &'static str> {
        match self {
            Operator::Eq | Operator::Ne => match operand {
                Value::Object(_) => Err("a scalar or array operand"),
                _ => Ok(()),
            },
            Operator::In | Operator::Nin => match operand {
                Value::Array(_) => Ok(()),
                _ => Err("an array operand"),
            },
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => match operand {
                Value::Number(_) | Value::String(_) => Ok(()),
                _ => Err("a number or string operand"),
            },
            Operator::Regex => match operand {
                Value::String(_) => Ok(()),
                _ => Err("a string pattern"),
            },
            Operator::Exists => match operand {
                Value::Bool(_) => Ok(()),
                _ => Err("a boolean operand"),
            },
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `field operator value` constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Constraint {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConditionError {
    #[error("condition must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("condition contains an empty field name")]
    EmptyField,
    #[error("field '{0}' has an empty operator object")]
    EmptyOperators(String),
    #[error("unknown operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },
    #[error("operator {operator} on field '{field}' expects {expected}")]
    InvalidOperand {
        field: String,
        operator: Operator,
        expected: &'static str,
    },
    #[error("invalid regular expression on field '{field}': {message}")]
    InvalidRegex { field: String, message: String },
}

/// Ordered conjunction of constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Condition {
    constraints: Vec<Constraint>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decompose a raw JSON filter into constraints.
    ///
    /// Scalar and array values are equality constraints. Object values must only
    /// hold operator keys; each operator becomes its own constraint, in key order.
    pub fn parse(raw: &Value) -> Result<Self, ConditionError> {
        let map = match raw {
            Value::Object(map) => map,
            other => return Err(ConditionError::NotAnObject(json_type_name(other))),
        };

        let mut condition = Self::new();
        for (field, value) in map {
            if field.trim().is_empty() {
                return Err(ConditionError::EmptyField);
            }

            match value {
                Value::Object(ops) => {
                    if ops.is_empty() {
                        return Err(ConditionError::EmptyOperators(field.clone()));
                    }
                    for (key, operand) in ops {
                        let operator = Operator::from_key(key).ok_or_else(|| {
                            ConditionError::UnknownOperator {
                                field: field.clone(),
                                operator: key.clone(),
                            }
                        })?;
                        operator.accepts(operand).map_err(|expected| {
                            ConditionError::InvalidOperand {
                                field: field.clone(),
                                operator,
                                expected,
                            }
                        })?;
                        if operator == Operator::Regex {
                            validate_pattern(field, operand)?;
                        }
                        condition.push(Constraint::new(field.clone(), operator, operand.clone()));
                    }
                }
                other => {
                    condition.push(Constraint::new(field.clone(), Operator::Eq, other.clone()));
                }
            }
        }

        Ok(condition)
    }

    pub fn push(&mut self, constraint: Constraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    /// Start a constraint on `name`.
    pub fn field(&mut self, name: impl Into<String>) -> FieldBuilder<'_> {
        FieldBuilder {
            condition: self,
            field: name.into(),
        }
    }

    /// Append a mandatory equality constraint after everything already present.
    pub fn with_scope(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints
            .push(Constraint::new(field, Operator::Eq, value));
        self
    }

    /// True when any constraint targets `field`.
    pub fn constrains(&self, field: &str) -> bool {
        self.constraints.iter().any(|c| c.field == field)
    }

    /// Drop every constraint on the given fields.
    pub fn without_fields(mut self, fields: &[&str]) -> Self {
        self.constraints
            .retain(|c| !fields.contains(&c.field.as_str()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Evaluate the conjunction against a flat JSON record.
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        self.constraints
            .iter()
            .all(|c| eval::matches_constraint(c, record))
    }
}

impl<'a> IntoIterator for &'a Condition {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.iter()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraints.is_empty() {
            return f.write_str("<all>");
        }
        for (i, c) in self.constraints.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{} {} {}", c.field, c.operator, c.value)?;
        }
        Ok(())
    }
}

/// Fluent constraint builder returned by [`Condition::field`].
pub struct FieldBuilder<'a> {
    condition: &'a mut Condition,
    field: String,
}

impl<'a> FieldBuilder<'a> {
    fn op(self, operator: Operator, value: Value) -> &'a mut Condition {
        let FieldBuilder { condition, field } = self;
        condition.push(Constraint::new(field, operator, value))
    }

    pub fn eq(self, value: impl Into<Value>) -> &'a mut Condition {
        self.op(Operator::Eq, value.into())
    }

    pub fn ne(self, value: impl Into<Value>) -> &'a mut Condition {
        self.op(Operator::Ne, value.into())
    }

    pub fn in_<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> &'a mut Condition {
        let values = values.into_iter().map(Into::into).collect();
        self.op(Operator::In, Value::Array(values))
    }

    pub fn nin<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> &'a mut Condition {
        let values = values.into_iter().map(Into::into).collect();
        self.op(Operator::Nin, Value::Array(values))
    }

    pub fn lt(self, value: impl Into<Value>) -> &'a mut Condition {
        self.op(Operator::Lt, value.into())
    }

    pub fn lte(self, value: impl Into<Value>) -> &'a mut Condition {
        self.op(Operator::Lte, value.into())
    }

    pub fn gt(self, value: impl Into<Value>) -> &'a mut Condition {
        self.op(Operator::Gt, value.into())
    }

    pub fn gte(self, value: impl Into<Value>) -> &'a mut Condition {
        self.op(Operator::Gte, value.into())
    }

    pub fn exists(self, present: bool) -> &'a mut Condition {
        self.op(Operator::Exists, Value::Bool(present))
    }
}

fn validate_pattern(field: &str, operand: &Value) -> Result<(), ConditionError> {
    let pattern = operand.as_str().unwrap_or_default();
    regex::Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConditionError::InvalidRegex {
            field: field.to_string(),
            message: e.to_string(),
        })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
