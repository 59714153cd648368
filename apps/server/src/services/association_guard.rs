//! Association guard
//!
//! Answers whether any association still points at a business instance.
//! Consulted before a business is disabled.

use crate::{
    db::AssociationStore,
    models::{field, ObjectSchema, RequestContext},
    Error, Result,
};
use cmdb_condition::Condition;
use std::sync::Arc;

#[derive(Clone)]
pub struct AssociationGuard {
    store: Arc<dyn AssociationStore>,
}

impl AssociationGuard {
    pub fn new(store: Arc<dyn AssociationStore>) -> Self {
        Self { store }
    }

    /// Number of associations in the caller's owner scope whose target is
    /// instance `biz_id` of `schema`.
    pub async fn reference_count(
        &self,
        ctx: &RequestContext,
        schema: &ObjectSchema,
        biz_id: i64,
    ) -> Result<i64> {
        let mut condition = Condition::new();
        condition
            .field(field::ASST_OBJ_ID)
            .eq(schema.obj_id.as_str())
            .field(field::OWNER_ID)
            .eq(ctx.owner.as_str())
            .field(field::ASST_INST_ID)
            .eq(biz_id);

        let count = self.store.count(&condition).await?;
        tracing::debug!(
            request_id = %ctx.request_id,
            biz_id,
            %condition,
            count,
            "Counted association references"
        );
        Ok(count)
    }

    pub async fn has_reference(
        &self,
        ctx: &RequestContext,
        schema: &ObjectSchema,
        biz_id: i64,
    ) -> Result<bool> {
        Ok(self.reference_count(ctx, schema, biz_id).await? > 0)
    }

    /// `Err(StillReferenced)` when at least one association targets `biz_id`.
    pub async fn ensure_unreferenced(
        &self,
        ctx: &RequestContext,
        schema: &ObjectSchema,
        biz_id: i64,
    ) -> Result<()> {
        let references = self.reference_count(ctx, schema, biz_id).await?;
        if references > 0 {
            return Err(Error::StillReferenced { biz_id, references });
        }
        Ok(())
    }
}
