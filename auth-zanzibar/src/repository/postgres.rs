//! PostgreSQL-backed tuple repository
//!
//! Tuples live in a single `relation_tuples` table whose primary key is the
//! five-field tuple key. Inserts use `ON CONFLICT DO NOTHING`, so a concurrent
//! double grant resolves to one row and one duplicate outcome without an
//! error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    error::{Result, ZanzibarError},
    models::*,
    repository::{reject_unfiltered_delete, InsertOutcome, TupleRepository},
};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS relation_tuples (
        namespace    TEXT        NOT NULL,
        object_id    TEXT        NOT NULL,
        relation     TEXT        NOT NULL,
        subject_type TEXT        NOT NULL,
        subject_id   TEXT        NOT NULL,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (namespace, object_id, relation, subject_type, subject_id)
    )
"#;

const CREATE_SUBJECT_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS relation_tuples_subject_idx
        ON relation_tuples (subject_type, subject_id, namespace, relation)
"#;

/// PostgreSQL-backed tuple repository
#[derive(Clone)]
pub struct PostgresTupleRepository {
    pool: PgPool,
}

impl PostgresTupleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool
    pub async fn connect(
        connection_string: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(connection_string)
            .await
            .map_err(|e| ZanzibarError::Persistence(format!("Failed to connect: {}", e)))?;

        info!(max_connections, "Tuple store connection pool created");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the tuple table and subject index when missing
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in [CREATE_TABLE, CREATE_SUBJECT_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    ZanzibarError::Persistence(format!("Failed to create schema: {}", e))
                })?;
        }
        info!("Tuple store schema ensured");
        Ok(())
    }

    /// `WHERE` clause for a filter plus the values to bind, in order
    fn where_clause(filter: &TupleFilter) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        let columns = [
            ("namespace", filter.namespace.map(|ns| ns.as_str().to_string())),
            ("object_id", filter.object_id.clone()),
            ("relation", filter.relation.map(|rel| rel.as_str().to_string())),
            ("subject_type", filter.subject_type.map(|st| st.as_str().to_string())),
            ("subject_id", filter.subject_id.clone()),
        ];

        for (column, value) in columns {
            if let Some(value) = value {
                binds.push(value);
                clauses.push(format!("{} = ${}", column, binds.len()));
            }
        }

        if clauses.is_empty() {
            (String::new(), binds)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), binds)
        }
    }

    fn parse_row(row: &PgRow) -> Result<RelationTuple> {
        let text = |column: &str| -> Result<String> {
            row.try_get::<String, _>(column).map_err(|e| {
                ZanzibarError::Persistence(format!("Failed to read column {}: {}", column, e))
            })
        };
        let corrupt = |e: ZanzibarError| {
            ZanzibarError::Persistence(format!("Corrupt tuple row: {}", e))
        };

        Ok(RelationTuple {
            namespace: text("namespace")?.parse().map_err(corrupt)?,
            object_id: text("object_id")?,
            relation: text("relation")?.parse().map_err(corrupt)?,
            subject_type: text("subject_type")?.parse().map_err(corrupt)?,
            subject_id: text("subject_id")?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| {
                    ZanzibarError::Persistence(format!("Failed to read created_at: {}", e))
                })?,
        })
    }

    async fn select(&self, filter: &TupleFilter, limit: Option<i64>) -> Result<Vec<RelationTuple>> {
        let (where_clause, binds) = Self::where_clause(filter);
        let mut sql = format!(
            "SELECT namespace, object_id, relation, subject_type, subject_id, created_at \
             FROM relation_tuples{} \
             ORDER BY namespace, object_id, relation, subject_type, subject_id",
            where_clause
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = query.bind(bind);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ZanzibarError::Persistence(format!("Failed to read tuples: {}", e)))?;

        rows.iter().map(Self::parse_row).collect()
    }
}

#[async_trait]
impl TupleRepository for PostgresTupleRepository {
    async fn find_one(&self, filter: &TupleFilter) -> Result<Option<RelationTuple>> {
        Ok(self.select(filter, Some(1)).await?.into_iter().next())
    }

    async fn find_many(&self, filter: &TupleFilter) -> Result<Vec<RelationTuple>> {
        let tuples = self.select(filter, None).await?;
        debug!("Found {} tuples", tuples.len());
        Ok(tuples)
    }

    async fn insert(&self, tuple: &RelationTuple) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO relation_tuples (
                namespace, object_id, relation, subject_type, subject_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (namespace, object_id, relation, subject_type, subject_id) DO NOTHING
            "#,
        )
        .bind(tuple.namespace.as_str())
        .bind(&tuple.object_id)
        .bind(tuple.relation.as_str())
        .bind(tuple.subject_type.as_str())
        .bind(&tuple.subject_id)
        .bind(tuple.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ZanzibarError::Persistence(format!("Failed to write tuple: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn delete_many(&self, filter: &TupleFilter) -> Result<u64> {
        reject_unfiltered_delete(filter)?;

        let (where_clause, binds) = Self::where_clause(filter);
        let sql = format!("DELETE FROM relation_tuples{}", where_clause);

        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = query.bind(bind);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| ZanzibarError::Persistence(format!("Failed to delete tuples: {}", e)))?;

        Ok(result.rows_affected())
    }
}
