//! Store and resolver interfaces used by the services.

use crate::{
    models::{Business, BusinessQuery, InternalModuleSet, NewBusiness, ObjectSchema},
    Result,
};
use async_trait::async_trait;
use cmdb_condition::Condition;
use serde_json::{Map, Value as JsonValue};

/// Resolves a symbolic object type to its schema.
#[async_trait]
pub trait SchemaResolver: Send + Sync {
    /// Returns `Error::SchemaNotFound` when the object type is unknown.
    async fn find_object(&self, obj_id: &str) -> Result<ObjectSchema>;
}

/// Persistence for business records and their internal module set.
#[async_trait]
pub trait BusinessStore: Send + Sync {
    /// Insert a business together with its internal module set.
    ///
    /// Fails with `Error::DefaultBusinessExists` when `new.default` marks a
    /// default business and the owner already has one.
    async fn create(&self, new: NewBusiness) -> Result<Business>;

    /// Total match count and the requested page.
    async fn find(&self, query: &BusinessQuery) -> Result<(i64, Vec<Business>)>;

    /// Merge `attributes` into the record. Returns the number of records changed.
    async fn update(
        &self,
        owner: &str,
        biz_id: i64,
        attributes: &Map<String, JsonValue>,
    ) -> Result<u64>;

    /// Remove the record and its internal module set. Returns the number removed.
    async fn delete(&self, owner: &str, biz_id: i64) -> Result<u64>;

    async fn internal_module(&self, owner: &str, biz_id: i64)
        -> Result<Option<InternalModuleSet>>;
}

/// Read-only access to association records.
#[async_trait]
pub trait AssociationStore: Send + Sync {
    async fn count(&self, condition: &Condition) -> Result<i64>;
}
