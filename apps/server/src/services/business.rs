//! Business lifecycle service
//!
//! Creation, update, deletion, status changes and owner-scoped search of
//! business instances, plus the per-owner default business.

use crate::{
    config::SearchConfig,
    db::{BusinessStore, SchemaResolver},
    metrics::OperationTimer,
    models::{
        field, parse_biz_id, Business, BusinessQuery, DataStatus, InternalModuleSet, NewBusiness,
        ObjectSchema, RequestContext, SearchRequest, SearchResult, SortSpec, BIZ_OBJ_ID,
        DEFAULT_APP_FLAG, ORDINARY_APP_FLAG,
    },
    services::AssociationGuard,
    Error, Result,
};
use cmdb_condition::Condition;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use validator::Validate;

/// Page bounds applied to searches.
#[derive(Debug, Clone, Copy)]
pub struct SearchPolicy {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchPolicy {
    fn from(config: &SearchConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }
}

pub struct BusinessService {
    schemas: Arc<dyn SchemaResolver>,
    store: Arc<dyn BusinessStore>,
    guard: AssociationGuard,
    policy: SearchPolicy,
}

impl BusinessService {
    pub fn new(
        schemas: Arc<dyn SchemaResolver>,
        store: Arc<dyn BusinessStore>,
        guard: AssociationGuard,
        policy: SearchPolicy,
    ) -> Self {
        Self {
            schemas,
            store,
            guard,
            policy,
        }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        attributes: Map<String, JsonValue>,
    ) -> Result<Business> {
        let timer = OperationTimer::start("create");
        let result = self.create_business(ctx, attributes, ORDINARY_APP_FLAG).await;
        timer.finish(&result);
        result
    }

    /// Create the owner's default business. At most one may exist per owner.
    pub async fn create_default(
        &self,
        ctx: &RequestContext,
        attributes: Map<String, JsonValue>,
    ) -> Result<Business> {
        let timer = OperationTimer::start("create_default");
        let result = self.create_business(ctx, attributes, DEFAULT_APP_FLAG).await;
        timer.finish(&result);
        result
    }

    pub async fn delete(&self, ctx: &RequestContext, raw_biz_id: &str) -> Result<()> {
        let timer = OperationTimer::start("delete");
        let result = self.delete_business(ctx, raw_biz_id).await;
        timer.finish(&result);
        result
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        raw_biz_id: &str,
        attributes: Map<String, JsonValue>,
    ) -> Result<()> {
        let timer = OperationTimer::start("update");
        let result = self.update_business(ctx, raw_biz_id, attributes).await;
        timer.finish(&result);
        result
    }

    /// Move a business between `enabled` and `disabled`.
    ///
    /// Disabling is refused while any association in the owner scope still
    /// targets the business. Enabling is unconditional.
    pub async fn change_status(
        &self,
        ctx: &RequestContext,
        raw_biz_id: &str,
        raw_status: &str,
    ) -> Result<()> {
        let timer = OperationTimer::start("change_status");
        let result = self.change_business_status(ctx, raw_biz_id, raw_status).await;
        timer.finish(&result);
        result
    }

    /// Owner-scoped search over ordinary businesses.
    pub async fn search(&self, ctx: &RequestContext, request: SearchRequest) -> Result<SearchResult> {
        let timer = OperationTimer::start("search");
        let result = self.search_businesses(ctx, request).await;
        timer.finish(&result);
        result
    }

    /// Look up the owner's default business.
    ///
    /// Caller constraints on status, default flag and owner are discarded;
    /// everything else in the filter still applies.
    pub async fn search_default(
        &self,
        ctx: &RequestContext,
        raw_filter: JsonValue,
    ) -> Result<SearchResult> {
        let timer = OperationTimer::start("search_default");
        let result = self.search_default_business(ctx, raw_filter).await;
        timer.finish(&result);
        result
    }

    pub async fn get_internal_module(
        &self,
        ctx: &RequestContext,
        raw_biz_id: &str,
    ) -> Result<InternalModuleSet> {
        let timer = OperationTimer::start("get_internal_module");
        let result = self.internal_module(ctx, raw_biz_id).await;
        timer.finish(&result);
        result
    }

    async fn business_schema(&self) -> Result<ObjectSchema> {
        self.schemas.find_object(BIZ_OBJ_ID).await
    }

    async fn create_business(
        &self,
        ctx: &RequestContext,
        mut attributes: Map<String, JsonValue>,
        default: i64,
    ) -> Result<Business> {
        for reserved in field::RESERVED {
            if attributes.remove(*reserved).is_some() {
                tracing::debug!(field = reserved, "Dropped reserved field from create input");
            }
        }
        let status = match attributes.remove(field::DATA_STATUS) {
            None | Some(JsonValue::Null) => DataStatus::Enabled,
            Some(JsonValue::String(raw)) => DataStatus::parse(&raw)?,
            Some(other) => return Err(Error::InvalidStatusValue(other.to_string())),
        };

        let schema = self.business_schema().await?;
        if let Some(missing) = schema.missing_required(&attributes) {
            return Err(Error::InvalidParameter(format!(
                "missing required attribute '{}'",
                missing
            )));
        }

        if default == DEFAULT_APP_FLAG && self.default_exists(ctx).await? {
            return Err(Error::DefaultBusinessExists(ctx.owner.clone()));
        }

        let business = self
            .store
            .create(NewBusiness {
                owner: ctx.owner.clone(),
                default,
                status,
                attributes,
            })
            .await?;

        tracing::info!(
            request_id = %ctx.request_id,
            owner = %ctx.owner,
            biz_id = business.biz_id,
            default,
            "Business created"
        );
        Ok(business)
    }

    async fn default_exists(&self, ctx: &RequestContext) -> Result<bool> {
        let mut condition = Condition::new();
        condition
            .field(field::DEFAULT)
            .eq(DEFAULT_APP_FLAG)
            .field(field::OWNER_ID)
            .eq(ctx.owner.as_str());
        let query = BusinessQuery {
            condition,
            start: 0,
            limit: Some(1),
            sort: SortSpec::default(),
        };
        let (count, _) = self.store.find(&query).await?;
        Ok(count > 0)
    }

    async fn delete_business(&self, ctx: &RequestContext, raw_biz_id: &str) -> Result<()> {
        let biz_id = parse_biz_id(raw_biz_id)?;
        self.business_schema().await?;

        // Unlike disabling, deletion does not consult the association guard.
        let removed = self.store.delete(&ctx.owner, biz_id).await?;
        if removed == 0 {
            return Err(Error::NotFound(format!("business {}", biz_id)));
        }

        tracing::info!(
            request_id = %ctx.request_id,
            owner = %ctx.owner,
            biz_id,
            "Business deleted"
        );
        Ok(())
    }

    async fn update_business(
        &self,
        ctx: &RequestContext,
        raw_biz_id: &str,
        attributes: Map<String, JsonValue>,
    ) -> Result<()> {
        let biz_id = parse_biz_id(raw_biz_id)?;
        if let Some(key) = attributes
            .keys()
            .find(|k| field::RESERVED.contains(&k.as_str()))
        {
            return Err(Error::InvalidParameter(format!(
                "field '{}' cannot be updated",
                key
            )));
        }
        if attributes.contains_key(field::DATA_STATUS) {
            return Err(Error::InvalidParameter(format!(
                "'{}' can only be changed through the status endpoint",
                field::DATA_STATUS
            )));
        }

        let schema = self.business_schema().await?;
        if let Some(key) = schema.first_non_editable(&attributes) {
            return Err(Error::InvalidParameter(format!(
                "attribute '{}' is not editable",
                key
            )));
        }
        if let Some(key) = cleared_required(&schema, &attributes) {
            return Err(Error::InvalidParameter(format!(
                "required attribute '{}' cannot be cleared",
                key
            )));
        }

        self.apply(ctx, biz_id, &attributes).await?;
        tracing::info!(
            request_id = %ctx.request_id,
            owner = %ctx.owner,
            biz_id,
            fields = attributes.len(),
            "Business updated"
        );
        Ok(())
    }

    async fn change_business_status(
        &self,
        ctx: &RequestContext,
        raw_biz_id: &str,
        raw_status: &str,
    ) -> Result<()> {
        let biz_id = parse_biz_id(raw_biz_id)?;
        let status = DataStatus::parse(raw_status)?;
        let schema = self.business_schema().await?;

        if status == DataStatus::Disabled {
            // Check and write are separate store calls: an association added
            // between them leaves a disabled business referenced.
            if let Err(e) = self.guard.ensure_unreferenced(ctx, &schema, biz_id).await {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    owner = %ctx.owner,
                    biz_id,
                    error = %e,
                    "Refusing to disable business"
                );
                return Err(e);
            }
        }

        let mut patch = Map::new();
        patch.insert(
            field::DATA_STATUS.to_string(),
            JsonValue::String(status.as_str().to_string()),
        );
        self.apply(ctx, biz_id, &patch).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            owner = %ctx.owner,
            biz_id,
            status = %status,
            "Business status changed"
        );
        Ok(())
    }

    async fn apply(
        &self,
        ctx: &RequestContext,
        biz_id: i64,
        patch: &Map<String, JsonValue>,
    ) -> Result<()> {
        let changed = self.store.update(&ctx.owner, biz_id, patch).await?;
        if changed == 0 {
            return Err(Error::NotFound(format!("business {}", biz_id)));
        }
        Ok(())
    }

    async fn search_businesses(
        &self,
        ctx: &RequestContext,
        request: SearchRequest,
    ) -> Result<SearchResult> {
        self.business_schema().await?;

        let mut condition = match &request.condition {
            Some(raw) => Condition::parse(raw)?,
            None => Condition::new(),
        };
        let fields = parse_fields(request.fields.as_ref())?;

        let page = request.page;
        page.validate()
            .map_err(|e| Error::InvalidParameter(format!("invalid page: {}", e)))?;
        let limit = page.limit.unwrap_or(self.policy.default_limit);
        if limit > self.policy.max_limit {
            return Err(Error::InvalidParameter(format!(
                "page limit {} exceeds the maximum of {}",
                limit, self.policy.max_limit
            )));
        }
        let sort = SortSpec::parse(page.sort.as_deref())?;

        if !condition.constrains(field::DATA_STATUS) {
            condition
                .field(field::DATA_STATUS)
                .ne(DataStatus::Disabled.as_str());
        }
        let condition = condition
            .with_scope(field::DEFAULT, ORDINARY_APP_FLAG)
            .with_scope(field::OWNER_ID, ctx.owner.as_str());

        tracing::debug!(
            request_id = %ctx.request_id,
            %condition,
            start = page.start,
            limit,
            "Searching businesses"
        );

        let query = BusinessQuery {
            condition,
            start: page.start,
            limit: Some(limit),
            sort,
        };
        let (count, items) = self.store.find(&query).await?;

        let info = items
            .iter()
            .map(|b| project(b.to_record(), fields.as_deref()))
            .collect();
        Ok(SearchResult { count, info })
    }

    async fn search_default_business(
        &self,
        ctx: &RequestContext,
        raw_filter: JsonValue,
    ) -> Result<SearchResult> {
        self.business_schema().await?;

        let condition = match raw_filter {
            JsonValue::Null => Condition::new(),
            raw => Condition::parse(&raw)?,
        };

        let condition = condition
            .without_fields(field::DEFAULT_SCOPE)
            .with_scope(field::DEFAULT, DEFAULT_APP_FLAG)
            .with_scope(field::OWNER_ID, ctx.owner.as_str());

        tracing::debug!(
            request_id = %ctx.request_id,
            %condition,
            "Searching default business"
        );

        let query = BusinessQuery {
            condition,
            start: 0,
            limit: None,
            sort: SortSpec::default(),
        };
        let (count, items) = self.store.find(&query).await?;

        Ok(SearchResult {
            count,
            info: items
                .iter()
                .map(|b| JsonValue::Object(b.to_record()))
                .collect(),
        })
    }

    async fn internal_module(
        &self,
        ctx: &RequestContext,
        raw_biz_id: &str,
    ) -> Result<InternalModuleSet> {
        let biz_id = parse_biz_id(raw_biz_id)?;
        self.business_schema().await?;

        self.store
            .internal_module(&ctx.owner, biz_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("business {}", biz_id)))
    }
}

/// Projection list from a search body. Absent or empty means full records.
fn parse_fields(raw: Option<&JsonValue>) -> Result<Option<Vec<String>>> {
    let items = match raw {
        None | Some(JsonValue::Null) => return Ok(None),
        Some(JsonValue::Array(items)) => items,
        Some(other) => {
            return Err(Error::InvalidFieldList(format!(
                "expected an array of field names, got {}",
                other
            )))
        }
    };

    let mut fields = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(name) if !name.is_empty() => fields.push(name.to_string()),
            _ => {
                return Err(Error::InvalidFieldList(format!(
                    "field names must be non-empty strings, got {}",
                    item
                )))
            }
        }
    }

    Ok(if fields.is_empty() { None } else { Some(fields) })
}

fn project(mut record: Map<String, JsonValue>, fields: Option<&[String]>) -> JsonValue {
    if let Some(fields) = fields {
        record.retain(|key, _| fields.iter().any(|f| f == key));
    }
    JsonValue::Object(record)
}

/// First required attribute present in `attributes` with an empty value.
fn cleared_required<'a>(
    schema: &ObjectSchema,
    attributes: &'a Map<String, JsonValue>,
) -> Option<&'a str> {
    attributes
        .iter()
        .filter(|(key, _)| schema.attribute(key).is_some_and(|a| a.required))
        .find(|(_, value)| match value {
            JsonValue::Null => true,
            JsonValue::String(s) => s.trim().is_empty(),
            _ => false,
        })
        .map(|(key, _)| key.as_str())
}
