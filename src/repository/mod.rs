//! Generic data access.
//!
//! [`Repository<E>`] provides create / read / update / delete / filter over any
//! type implementing [`Entity`]. Every operation runs inside its own transaction:
//! success commits, failure rolls back, and the store's error is translated into a
//! [`RepoError`] that keeps the original `sqlx::Error` as its source.
//!
//! Column names never come from user input directly: every name in a [`Fields`]
//! mapping is checked against [`Entity::COLUMNS`] before it reaches SQL, and only
//! the matching `&'static str` is pushed into the query text.

mod fields;
pub mod tasks;
pub mod users;

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};

pub use fields::{FieldValue, Fields};
pub use tasks::TasksRepository;
pub use users::UsersRepository;

/// A table-backed record the generic repository can manage.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    /// Table name.
    const TABLE: &'static str;
    /// Human readable name used in error messages.
    const NAME: &'static str;
    /// Every column of the table.
    const COLUMNS: &'static [&'static str];
    /// Columns callers may not write. `updated_at` is stamped by the repository.
    const IMMUTABLE: &'static [&'static str] = &["id", "created_at", "updated_at"];

    fn id(&self) -> i32;
}

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("database error in '{op}': {source}")]
    Database {
        op: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl RepoError {
    fn from_sqlx<E: Entity>(op: &'static str, source: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &source {
            if db_err.is_unique_violation() {
                return RepoError::Conflict(format!("{} already exists", E::NAME));
            }
            if db_err.is_foreign_key_violation() {
                return RepoError::Validation(format!(
                    "{} references a record that does not exist",
                    E::NAME
                ));
            }
        }
        RepoError::Database { op, source }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

pub struct Repository<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub async fn get_by_id(&self, id: i32) -> RepoResult<E> {
        const OP: &str = "get_by_id";
        let mut tx = self.begin(OP).await?;
        let sql = format!("SELECT * FROM {} WHERE id = $1", E::TABLE);
        let result = sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepoError::from_sqlx::<E>(OP, e))
            .and_then(|row| row.ok_or(RepoError::NotFound { entity: E::NAME }));
        Self::finish(OP, tx, result).await
    }

    pub async fn get_all(&self) -> RepoResult<Vec<E>> {
        const OP: &str = "get_all";
        let mut tx = self.begin(OP).await?;
        let sql = format!("SELECT * FROM {} ORDER BY id", E::TABLE);
        let result = sqlx::query_as::<_, E>(&sql)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| RepoError::from_sqlx::<E>(OP, e));
        Self::finish(OP, tx, result).await
    }

    /// Inserts a row built from `fields` and returns it with generated columns filled.
    pub async fn create(&self, fields: Fields) -> RepoResult<E> {
        const OP: &str = "create";
        let mut builder = insert_query::<E>(&fields)?;
        let mut tx = self.begin(OP).await?;
        let result = builder
            .build_query_as::<E>()
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepoError::from_sqlx::<E>(OP, e));
        Self::finish(OP, tx, result).await
    }

    /// Applies the non-`None` values in `fields` to `entity` and bumps `updated_at`.
    pub async fn update(&self, entity: &E, fields: Fields) -> RepoResult<E> {
        const OP: &str = "update";
        let mut builder = update_query::<E>(entity.id(), &fields, Utc::now())?;
        let mut tx = self.begin(OP).await?;
        let result = builder
            .build_query_as::<E>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepoError::from_sqlx::<E>(OP, e))
            .and_then(|row| row.ok_or(RepoError::NotFound { entity: E::NAME }));
        Self::finish(OP, tx, result).await
    }

    pub async fn delete(&self, id: i32) -> RepoResult<()> {
        const OP: &str = "delete";
        let mut tx = self.begin(OP).await?;
        let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::from_sqlx::<E>(OP, e))
            .and_then(|done| {
                if done.rows_affected() == 0 {
                    Err(RepoError::NotFound { entity: E::NAME })
                } else {
                    Ok(())
                }
            });
        Self::finish(OP, tx, result).await
    }

    /// Returns every row matching all non-`None` equality filters, optionally
    /// restricted to rows created at or after `created_after`.
    pub async fn get_by_filters(
        &self,
        created_after: Option<DateTime<Utc>>,
        filters: Fields,
    ) -> RepoResult<Vec<E>> {
        const OP: &str = "get_by_filters";
        let mut builder = filter_query::<E>(created_after, &filters)?;
        let mut tx = self.begin(OP).await?;
        let result = builder
            .build_query_as::<E>()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| RepoError::from_sqlx::<E>(OP, e));
        Self::finish(OP, tx, result).await
    }

    async fn begin(&self, op: &'static str) -> RepoResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            error!("Could not open a transaction for '{}' on {}: {}", op, E::TABLE, e);
            RepoError::from_sqlx::<E>(op, e)
        })
    }

    /// Commits on success; rolls back and logs on failure.
    async fn finish<T>(
        op: &'static str,
        tx: Transaction<'static, Postgres>,
        result: RepoResult<T>,
    ) -> RepoResult<T> {
        match result {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| RepoError::from_sqlx::<E>(op, e))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Rollback failed in '{}' on {}: {}", op, E::TABLE, rollback_err);
                }
                match &err {
                    RepoError::Database { .. } => {
                        error!("Database error in the function '{}': {}", op, err)
                    }
                    RepoError::NotFound { .. } => debug!("'{}' on {}: {}", op, E::TABLE, err),
                    _ => warn!("'{}' on {} rejected: {}", op, E::TABLE, err),
                }
                Err(err)
            }
        }
    }
}

fn known_column<E: Entity>(name: &str) -> RepoResult<&'static str> {
    E::COLUMNS
        .iter()
        .copied()
        .find(|column| *column == name)
        .ok_or_else(|| {
            RepoError::Validation(format!("The {} field was not found in {}", name, E::NAME))
        })
}

fn is_immutable<E: Entity>(column: &str) -> bool {
    E::IMMUTABLE.contains(&column)
}

/// Known, writable columns that carry a value. Immutable columns are logged and dropped.
fn writable_values<'f, E: Entity>(
    fields: &'f Fields,
) -> RepoResult<Vec<(&'static str, &'f FieldValue)>> {
    let mut writable = Vec::new();
    for (name, value) in fields.iter() {
        let column = known_column::<E>(name)?;
        let Some(value) = value else {
            continue;
        };
        if is_immutable::<E>(column) {
            error!("The {} field of {} cannot be changed directly", column, E::NAME);
            continue;
        }
        writable.push((column, value));
    }
    Ok(writable)
}

pub(crate) fn insert_query<E: Entity>(fields: &Fields) -> RepoResult<QueryBuilder<'static, Postgres>> {
    let values = writable_values::<E>(fields)?;
    let mut builder = QueryBuilder::new(format!("INSERT INTO {}", E::TABLE));

    if values.is_empty() {
        builder.push(" DEFAULT VALUES");
    } else {
        builder.push(" (");
        for (i, (column, _)) in values.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(*column);
        }
        builder.push(") VALUES (");
        for (i, (_, value)) in values.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            value.push_bind(&mut builder);
        }
        builder.push(")");
    }

    builder.push(" RETURNING *");
    Ok(builder)
}

pub(crate) fn update_query<E: Entity>(
    id: i32,
    fields: &Fields,
    now: DateTime<Utc>,
) -> RepoResult<QueryBuilder<'static, Postgres>> {
    let values = writable_values::<E>(fields)?;
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", E::TABLE));

    for (column, value) in values {
        builder.push(column);
        builder.push(" = ");
        value.push_bind(&mut builder);
        builder.push(", ");
    }
    builder.push("updated_at = ");
    builder.push_bind(now);
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    Ok(builder)
}

pub(crate) fn filter_query<E: Entity>(
    created_after: Option<DateTime<Utc>>,
    filters: &Fields,
) -> RepoResult<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new(format!("SELECT * FROM {}", E::TABLE));
    let mut has_predicate = false;
    let mut next_clause = |builder: &mut QueryBuilder<'static, Postgres>| {
        builder.push(if has_predicate { " AND " } else { " WHERE " });
        has_predicate = true;
    };

    for (name, value) in filters.iter() {
        let column = known_column::<E>(name)?;
        if let Some(value) = value {
            next_clause(&mut builder);
            builder.push(column);
            builder.push(" = ");
            value.push_bind(&mut builder);
        }
    }

    if let Some(created_after) = created_after {
        next_clause(&mut builder);
        builder.push("created_at >= ");
        builder.push_bind(created_after);
    }

    builder.push(" ORDER BY id");
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, sqlx::FromRow)]
    #[allow(dead_code)]
    struct Widget {
        id: i32,
        label: String,
        weight: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    impl Entity for Widget {
        const TABLE: &'static str = "widgets";
        const NAME: &'static str = "Widget";
        const COLUMNS: &'static [&'static str] =
            &["id", "label", "weight", "created_at", "updated_at"];

        fn id(&self) -> i32 {
            self.id
        }
    }

    #[test_log::test]
    fn test_insert_skips_absent_values() {
        let fields = Fields::new()
            .set("label", "bolt")
            .set_opt::<i32>("weight", None);

        let builder = insert_query::<Widget>(&fields).unwrap();
        assert_eq!(
            builder.sql(),
            "INSERT INTO widgets (label) VALUES ($1) RETURNING *"
        );
    }

    #[test_log::test]
    fn test_insert_without_values_uses_defaults() {
        let builder = insert_query::<Widget>(&Fields::new()).unwrap();
        assert_eq!(builder.sql(), "INSERT INTO widgets DEFAULT VALUES RETURNING *");
    }

    #[test_log::test]
    fn test_update_ignores_nulls_and_stamps_updated_at() {
        let fields = Fields::new()
            .set("label", "X")
            .set_opt::<i32>("weight", None);

        let builder = update_query::<Widget>(7, &fields, Utc::now()).unwrap();
        assert_eq!(
            builder.sql(),
            "UPDATE widgets SET label = $1, updated_at = $2 WHERE id = $3 RETURNING *"
        );
    }

    #[test_log::test]
    fn test_update_skips_immutable_columns() {
        let fields = Fields::new().set("id", 99).set("created_at", Utc::now());

        let builder = update_query::<Widget>(7, &fields, Utc::now()).unwrap();
        assert_eq!(
            builder.sql(),
            "UPDATE widgets SET updated_at = $1 WHERE id = $2 RETURNING *"
        );
    }

    #[test_log::test]
    fn test_unknown_field_is_a_validation_error() {
        let fields = Fields::new().set("colour", "red");

        assert!(matches!(
            update_query::<Widget>(1, &fields, Utc::now()),
            Err(RepoError::Validation(_))
        ));
        assert!(matches!(
            insert_query::<Widget>(&fields),
            Err(RepoError::Validation(_))
        ));
        assert!(matches!(
            filter_query::<Widget>(None, &fields),
            Err(RepoError::Validation(_))
        ));
    }

    #[test_log::test]
    fn test_unknown_field_rejected_even_when_null() {
        let fields = Fields::new().set_opt::<String>("colour", None);
        assert!(update_query::<Widget>(1, &fields, Utc::now()).is_err());
    }

    #[test_log::test]
    fn test_filters_only_constrain_present_values() {
        let fields = Fields::new()
            .set_opt("label", Some("bolt"))
            .set_opt::<i32>("weight", None);

        let builder = filter_query::<Widget>(Some(Utc::now()), &fields).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT * FROM widgets WHERE label = $1 AND created_at >= $2 ORDER BY id"
        );
    }

    #[test_log::test]
    fn test_filters_without_predicates_select_everything() {
        let builder = filter_query::<Widget>(None, &Fields::new()).unwrap();
        assert_eq!(builder.sql(), "SELECT * FROM widgets ORDER BY id");
    }
}
