//! PostgreSQL-backed `AssociationStore`

use async_trait::async_trait;
use cmdb_condition::Condition;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{db::sql, db::traits::AssociationStore, Error, Result};

#[derive(Clone)]
pub struct PostgresAssociationStore {
    pool: PgPool,
}

impl PostgresAssociationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssociationStore for PostgresAssociationStore {
    async fn count(&self, condition: &Condition) -> Result<i64> {
        // Column names of inst_associations are the wire field names, so the
        // row's JSON form is directly addressable by conditions.
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM (SELECT to_jsonb(a) AS data FROM inst_associations a) rec WHERE TRUE",
        );
        sql::push_condition(&mut qb, "data", condition);

        qb.build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
