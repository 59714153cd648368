//! PostgreSQL-backed `SchemaResolver`

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};

use crate::{
    db::traits::SchemaResolver,
    models::{AttributeDefinition, ObjectSchema},
    Error, Result,
};

#[derive(Clone)]
pub struct PostgresSchemaResolver {
    pool: PgPool,
}

impl PostgresSchemaResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaResolver for PostgresSchemaResolver {
    async fn find_object(&self, obj_id: &str) -> Result<ObjectSchema> {
        let row = sqlx::query(
            "SELECT obj_id, obj_name, attributes
             FROM object_schemas
             WHERE obj_id = $1",
        )
        .bind(obj_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let Some(row) = row else {
            return Err(Error::SchemaNotFound(obj_id.to_string()));
        };

        let attributes: JsonValue = row.get("attributes");
        let attributes: Vec<AttributeDefinition> = serde_json::from_value(attributes)
            .map_err(|e| {
                Error::Internal(format!("Corrupt attribute list for object {}: {}", obj_id, e))
            })?;

        Ok(ObjectSchema {
            obj_id: row.get("obj_id"),
            obj_name: row.get("obj_name"),
            attributes,
        })
    }
}
