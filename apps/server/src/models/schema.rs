//! Object schema descriptors resolved by `SchemaResolver`.

use super::{field, BIZ_OBJ_ID};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Attribute declared by an object schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    #[serde(rename = "bk_property_id")]
    pub property_id: String,
    #[serde(rename = "bk_property_name")]
    pub property_name: String,
    #[serde(rename = "bk_property_type")]
    pub property_type: String,
    #[serde(rename = "isrequired", default)]
    pub required: bool,
    #[serde(rename = "editable", default = "default_true")]
    pub editable: bool,
}

fn default_true() -> bool {
    true
}

/// Schema descriptor of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(rename = "bk_obj_id")]
    pub obj_id: String,
    #[serde(rename = "bk_obj_name")]
    pub obj_name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

impl ObjectSchema {
    /// The business ("application") schema shipped with the server.
    pub fn builtin_business() -> Self {
        let attr = |id: &str, name: &str, ty: &str, required: bool| AttributeDefinition {
            property_id: id.to_string(),
            property_name: name.to_string(),
            property_type: ty.to_string(),
            required,
            editable: true,
        };

        Self {
            obj_id: BIZ_OBJ_ID.to_string(),
            obj_name: "Business".to_string(),
            attributes: vec![
                attr(field::BIZ_NAME, "Business name", "singlechar", true),
                attr("bk_biz_maintainer", "Operations staff", "objuser", false),
                attr("bk_biz_productor", "Product staff", "objuser", false),
                attr("bk_biz_developer", "Developers", "objuser", false),
                attr("bk_biz_tester", "Testers", "objuser", false),
                attr("life_cycle", "Life cycle", "enum", false),
                attr("language", "Language", "enum", false),
                attr("time_zone", "Time zone", "timezone", false),
                attr("operator", "Operator", "objuser", false),
            ],
        }
    }

    pub fn attribute(&self, property_id: &str) -> Option<&AttributeDefinition> {
        self.attributes
            .iter()
            .find(|a| a.property_id == property_id)
    }

    /// First required attribute that is absent, null or an empty string.
    pub fn missing_required<'a>(&'a self, data: &Map<String, JsonValue>) -> Option<&'a str> {
        self.attributes
            .iter()
            .filter(|a| a.required)
            .find(|a| match data.get(&a.property_id) {
                None | Some(JsonValue::Null) => true,
                Some(JsonValue::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(|a| a.property_id.as_str())
    }

    /// First attribute in `data` that the schema declares non-editable.
    pub fn first_non_editable<'a>(&self, data: &'a Map<String, JsonValue>) -> Option<&'a str> {
        data.keys()
            .find(|key| self.attribute(key).is_some_and(|a| !a.editable))
            .map(String::as_str)
    }
}
