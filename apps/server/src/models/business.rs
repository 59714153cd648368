use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// `default` value of an ordinary business.
pub const ORDINARY_APP_FLAG: i64 = 0;
/// `default` value of the per-owner singleton default business.
pub const DEFAULT_APP_FLAG: i64 = 1;

/// Availability state of a business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataStatus {
    Enabled,
    Disabled,
}

impl DataStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataStatus::Enabled => "enabled",
            DataStatus::Disabled => "disabled",
        }
    }

    /// Parse a status flag; anything but `enabled`/`disabled` is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "enabled" => Ok(DataStatus::Enabled),
            "disabled" => Ok(DataStatus::Disabled),
            other => Err(Error::InvalidStatusValue(other.to_string())),
        }
    }
}

impl fmt::Display for DataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored business instance.
///
/// Serializes to the flat record shape used on the wire and by conditions:
/// the fixed fields sit next to the schema-defined attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    #[serde(rename = "bk_biz_id")]
    pub biz_id: i64,
    #[serde(rename = "bk_supplier_account")]
    pub owner: String,
    pub default: i64,
    #[serde(rename = "bk_data_status")]
    pub status: DataStatus,
    pub create_time: DateTime<Utc>,
    pub last_time: DateTime<Utc>,
    #[serde(flatten)]
    pub attributes: Map<String, JsonValue>,
}

impl Business {
    pub fn is_default(&self) -> bool {
        self.default == DEFAULT_APP_FLAG
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes
            .get(super::field::BIZ_NAME)
            .and_then(|v| v.as_str())
    }

    /// Flat JSON record of this business.
    pub fn to_record(&self) -> Map<String, JsonValue> {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn from_record(record: JsonValue) -> Result<Self> {
        serde_json::from_value(record)
            .map_err(|e| Error::Internal(format!("Corrupt business record: {}", e)))
    }
}

/// Input to `BusinessStore::create`.
#[derive(Debug, Clone)]
pub struct NewBusiness {
    pub owner: String,
    pub default: i64,
    pub status: DataStatus,
    pub attributes: Map<String, JsonValue>,
}

/// A built-in module of a business's internal set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalModule {
    #[serde(rename = "bk_module_id")]
    pub module_id: i64,
    #[serde(rename = "bk_module_name")]
    pub module_name: String,
    pub default: i64,
}

/// The built-in set (idle pool) of a business and its modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalModuleSet {
    #[serde(rename = "bk_set_id")]
    pub set_id: i64,
    #[serde(rename = "bk_set_name")]
    pub set_name: String,
    pub module: Vec<InternalModule>,
}

impl InternalModuleSet {
    pub const SET_NAME: &'static str = "idle pool";
    pub const IDLE_MODULE_NAME: &'static str = "idle host";
    pub const FAULT_MODULE_NAME: &'static str = "fault host";
    pub const IDLE_MODULE_FLAG: i64 = 1;
    pub const FAULT_MODULE_FLAG: i64 = 2;

    /// Names and flags of the modules created with every business, in order.
    pub fn builtin_modules() -> [(&'static str, i64); 2] {
        [
            (Self::IDLE_MODULE_NAME, Self::IDLE_MODULE_FLAG),
            (Self::FAULT_MODULE_NAME, Self::FAULT_MODULE_FLAG),
        ]
    }
}

/// Parse a business id taken from a path segment.
///
/// Only positive base-10 integers are accepted.
pub fn parse_biz_id(raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::InvalidParameter(format!(
            "business id must be a positive integer, got '{}'",
            raw
        ))),
    }
}
