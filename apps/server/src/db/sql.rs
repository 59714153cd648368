//! Render conditions into Postgres predicates over a JSONB record column.
//!
//! Field names and values are always bound parameters; only the column
//! identifier (a compile-time constant) is spliced into the SQL text.

use cmdb_condition::{Condition, Operator};
use sqlx::{Postgres, QueryBuilder};

/// Append ` AND <predicate>` for every constraint in `condition`.
pub(crate) fn push_condition(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &'static str,
    condition: &Condition,
) {
    for c in condition {
        qb.push(" AND ");
        match c.operator {
            Operator::Eq => {
                qb.push(format!("({column} -> "));
                qb.push_bind(c.field.clone());
                qb.push(") = ");
                qb.push_bind(c.value.clone());
            }
            Operator::Ne => {
                qb.push(format!("({column} -> "));
                qb.push_bind(c.field.clone());
                qb.push(") IS DISTINCT FROM ");
                qb.push_bind(c.value.clone());
            }
            Operator::In | Operator::Nin => {
                if c.operator == Operator::Nin {
                    qb.push("NOT ");
                }
                qb.push(format!("(jsonb_exists({column}, "));
                qb.push_bind(c.field.clone());
                qb.push(") AND ");
                qb.push_bind(c.value.clone());
                qb.push(format!(" @> jsonb_build_array({column} -> "));
                qb.push_bind(c.field.clone());
                qb.push("))");
            }
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
                let op = match c.operator {
                    Operator::Lt => "<",
                    Operator::Lte => "<=",
                    Operator::Gt => ">",
                    _ => ">=",
                };
                // jsonb orders across types; restrict to same-typed values.
                qb.push(format!("(jsonb_typeof({column} -> "));
                qb.push_bind(c.field.clone());
                qb.push(") = jsonb_typeof(");
                qb.push_bind(c.value.clone());
                qb.push(format!(") AND ({column} -> "));
                qb.push_bind(c.field.clone());
                qb.push(format!(") {op} "));
                qb.push_bind(c.value.clone());
                qb.push(")");
            }
            Operator::Regex => {
                qb.push(format!("(jsonb_typeof({column} -> "));
                qb.push_bind(c.field.clone());
                qb.push(format!(") = 'string' AND ({column} ->> "));
                qb.push_bind(c.field.clone());
                qb.push(") ~ ");
                qb.push_bind(c.value.as_str().unwrap_or_default().to_string());
                qb.push(")");
            }
            Operator::Exists => {
                if !c.value.as_bool().unwrap_or(true) {
                    qb.push("NOT ");
                }
                qb.push(format!("jsonb_exists({column}, "));
                qb.push_bind(c.field.clone());
                qb.push(")");
            }
        }
    }
}

/// `ORDER BY` clause for a sort field, with the business id as tie-breaker.
pub(crate) fn push_order_by(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &'static str,
    field: &str,
    descending: bool,
) {
    let direction = if descending { "DESC" } else { "ASC" };
    qb.push(format!(" ORDER BY ({column} -> "));
    qb.push_bind(field.to_string());
    qb.push(format!(") {direction} NULLS LAST, biz_id {direction}"));
}
