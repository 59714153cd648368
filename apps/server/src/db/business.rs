//! PostgreSQL-backed `BusinessStore` implementation

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value as JsonValue};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::{
    db::{sql, traits::BusinessStore},
    models::{
        field, Business, BusinessQuery, InternalModule, InternalModuleSet, NewBusiness,
        DEFAULT_APP_FLAG,
    },
    Error, Result,
};

/// Partial unique index guaranteeing one default business per owner.
const ONE_DEFAULT_PER_OWNER: &str = "businesses_one_default_per_owner";

#[derive(Clone)]
pub struct PostgresBusinessStore {
    pub(crate) pool: PgPool,
}

impl PostgresBusinessStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BusinessStore for PostgresBusinessStore {
    async fn create(&self, new: NewBusiness) -> Result<Business> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let biz_id: i64 = sqlx::query_scalar("SELECT nextval('businesses_biz_id_seq')")
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let now = Utc::now();
        let business = Business {
            biz_id,
            owner: new.owner,
            default: new.default,
            status: new.status,
            create_time: now,
            last_time: now,
            attributes: new.attributes,
        };

        let inserted = sqlx::query(
            "INSERT INTO businesses (biz_id, owner, is_default, status, data, create_time, last_time)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(business.biz_id)
        .bind(&business.owner)
        .bind(business.default)
        .bind(business.status.as_str())
        .bind(JsonValue::Object(business.to_record()))
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            return Err(map_insert_error(e, &business.owner, business.default));
        }

        let set_id: i64 = sqlx::query_scalar("SELECT nextval('internal_topo_id_seq')")
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for (module_name, flag) in InternalModuleSet::builtin_modules() {
            sqlx::query(
                "INSERT INTO internal_modules (biz_id, set_id, set_name, module_id, module_name, module_default)
                 VALUES ($1, $2, $3, nextval('internal_topo_id_seq'), $4, $5)",
            )
            .bind(biz_id)
            .bind(set_id)
            .bind(InternalModuleSet::SET_NAME)
            .bind(module_name)
            .bind(flag)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(business)
    }

    async fn find(&self, query: &BusinessQuery) -> Result<(i64, Vec<Business>)> {
        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM businesses WHERE TRUE");
        sql::push_condition(&mut count_qb, "data", &query.condition);
        let count: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT data FROM businesses WHERE TRUE");
        sql::push_condition(&mut qb, "data", &query.condition);
        sql::push_order_by(&mut qb, "data", &query.sort.field, query.sort.descending);
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }
        qb.push(" OFFSET ");
        qb.push_bind(query.start);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let items = rows
            .into_iter()
            .map(|row| Business::from_record(row.get("data")))
            .collect::<Result<Vec<_>>>()?;

        Ok((count, items))
    }

    async fn update(
        &self,
        owner: &str,
        biz_id: i64,
        attributes: &Map<String, JsonValue>,
    ) -> Result<u64> {
        let now = Utc::now();
        let mut patch = attributes.clone();
        patch.insert(
            field::LAST_TIME.to_string(),
            serde_json::to_value(now)
                .map_err(|e| Error::Internal(format!("Failed to encode timestamp: {}", e)))?,
        );

        let result = sqlx::query(
            "UPDATE businesses
             SET data = data || $1,
                 status = COALESCE($1 ->> 'bk_data_status', status),
                 last_time = $2
             WHERE owner = $3 AND biz_id = $4",
        )
        .bind(JsonValue::Object(patch))
        .bind(now)
        .bind(owner)
        .bind(biz_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, owner: &str, biz_id: i64) -> Result<u64> {
        // internal_modules rows go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM businesses WHERE owner = $1 AND biz_id = $2")
            .bind(owner)
            .bind(biz_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }

    async fn internal_module(
        &self,
        owner: &str,
        biz_id: i64,
    ) -> Result<Option<InternalModuleSet>> {
        let rows = sqlx::query(
            "SELECT im.set_id, im.set_name, im.module_id, im.module_name, im.module_default
             FROM internal_modules im
             JOIN businesses b ON b.biz_id = im.biz_id
             WHERE b.owner = $1 AND b.biz_id = $2
             ORDER BY im.module_default, im.module_id",
        )
        .bind(owner)
        .bind(biz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let mut set = InternalModuleSet {
            set_id: first.get("set_id"),
            set_name: first.get("set_name"),
            module: Vec::with_capacity(rows.len()),
        };
        for row in &rows {
            set.module.push(InternalModule {
                module_id: row.get("module_id"),
                module_name: row.get("module_name"),
                default: row.get("module_default"),
            });
        }

        Ok(Some(set))
    }
}

fn map_insert_error(e: sqlx::Error, owner: &str, default: i64) -> Error {
    if default == DEFAULT_APP_FLAG {
        if let sqlx::Error::Database(db) = &e {
            if db.constraint() == Some(ONE_DEFAULT_PER_OWNER) {
                return Error::DefaultBusinessExists(owner.to_string());
            }
        }
    }
    Error::Database(e)
}
