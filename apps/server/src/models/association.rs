use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Directed association from one instance to another.
///
/// The topology layer only counts these; it never creates or mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationRef {
    #[serde(rename = "bk_obj_id")]
    pub obj_id: String,
    #[serde(rename = "bk_inst_id")]
    pub inst_id: i64,
    #[serde(rename = "bk_asst_obj_id")]
    pub asst_obj_id: String,
    #[serde(rename = "bk_asst_inst_id")]
    pub asst_inst_id: i64,
    #[serde(rename = "bk_supplier_account")]
    pub owner: String,
}

impl AssociationRef {
    /// Association from `(obj_id, inst_id)` to a business.
    pub fn to_business(
        owner: impl Into<String>,
        obj_id: impl Into<String>,
        inst_id: i64,
        biz_id: i64,
    ) -> Self {
        Self {
            obj_id: obj_id.into(),
            inst_id,
            asst_obj_id: super::BIZ_OBJ_ID.to_string(),
            asst_inst_id: biz_id,
            owner: owner.into(),
        }
    }

    pub fn to_record(&self) -> Map<String, JsonValue> {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
