//! Search request/response shapes.

use super::field;
use crate::{Error, Result};
use cmdb_condition::Condition;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

/// Paging parameters supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Page {
    #[serde(default)]
    #[validate(range(min = 0))]
    pub start: i64,
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
    /// Sort field; a leading `-` sorts descending.
    pub sort: Option<String>,
}

/// Body of a business search.
///
/// `condition` and `fields` stay raw here: their shape is validated by the
/// service so that malformed input maps to the dedicated error kinds.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub condition: Option<JsonValue>,
    pub fields: Option<JsonValue>,
    pub page: Page,
}

impl SearchRequest {
    pub fn from_value(body: JsonValue) -> Result<Self> {
        let mut body = match body {
            JsonValue::Object(map) => map,
            JsonValue::Null => return Ok(Self::default()),
            _ => {
                return Err(Error::InvalidParameter(
                    "search body must be a JSON object".to_string(),
                ))
            }
        };

        let page = match body.remove("page") {
            None | Some(JsonValue::Null) => Page::default(),
            Some(raw) => serde_json::from_value(raw)
                .map_err(|e| Error::InvalidParameter(format!("invalid page: {}", e)))?,
        };

        Ok(Self {
            condition: body.remove("condition").filter(|v| !v.is_null()),
            fields: body.remove("fields").filter(|v| !v.is_null()),
            page,
        })
    }
}

/// Sort order handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty());
        let Some(raw) = raw else {
            return Ok(Self::default());
        };

        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if field.is_empty() {
            return Err(Error::InvalidParameter(format!("invalid sort '{}'", raw)));
        }

        Ok(Self {
            field: field.to_string(),
            descending,
        })
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: field::BIZ_ID.to_string(),
            descending: false,
        }
    }
}

/// Fully scoped query passed to `BusinessStore::find`.
#[derive(Debug, Clone)]
pub struct BusinessQuery {
    pub condition: Condition,
    pub start: i64,
    /// `None` returns every match.
    pub limit: Option<i64>,
    pub sort: SortSpec,
}

/// `{count, info}` search response.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub count: i64,
    pub info: Vec<JsonValue>,
}
