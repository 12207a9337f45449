//! Anime catalog repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryAs};
use sqlx::{Pool, Postgres, Transaction};
use tracing::{debug, trace};

use anidex_core::{
    AnimeEntry, EntryRepository, EntrySession, Error, Field, FieldKind, FieldValue, Result,
};

const TABLE: &str = "anime_library";

/// Comma-separated canonical column list, key first.
fn column_list() -> String {
    Field::ALL
        .iter()
        .map(|f| f.header())
        .collect::<Vec<_>>()
        .join(", ")
}

fn select_sql(filter: &str) -> String {
    format!("SELECT {} FROM {} {}", column_list(), TABLE, filter)
}

fn insert_sql() -> String {
    // A new record with no finished-episode count starts at zero.
    let placeholders = Field::ALL
        .iter()
        .enumerate()
        .map(|(i, &f)| match f {
            Field::EpFin => format!("COALESCE(${}, 0)", i + 1),
            _ => format!("${}", i + 1),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        TABLE,
        column_list(),
        placeholders
    )
}

fn update_sql() -> String {
    // system_id is bound first and used only in the WHERE clause.
    let assignments = Field::ALL
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, f)| format!("{} = ${}", f.header(), i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {}, updated_at_utc = now() WHERE system_id = $1",
        TABLE, assignments
    )
}

/// Selection rule for records still missing metadata.
///
/// Mirrors [`anidex_core::needs_enrichment`]: airing status is compared after
/// folding case and dropping separators.
const ENRICHMENT_FILTER: &str = r#"
    WHERE mal_id IS NOT NULL
      AND (
        cover_image_url IS NULL
        OR (
          mal_rating IS NULL
          AND COALESCE(regexp_replace(lower(airing_status), '[^a-z0-9]', '', 'g'), '') <> 'notyetaired'
        )
      )
    ORDER BY system_id
"#;

/// Bind every canonical column of `entry` in `Field::ALL` order.
fn bind_entry<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    entry: &AnimeEntry,
) -> Query<'q, Postgres, PgArguments> {
    for &field in Field::ALL {
        let value = entry.get(field);
        query = match field.kind() {
            FieldKind::Text => query.bind(value.map(|v| v.to_cell())),
            FieldKind::Int => query.bind(match value {
                Some(FieldValue::Int(n)) => Some(n),
                _ => None,
            }),
            FieldKind::Float => query.bind(match value {
                Some(FieldValue::Float(f)) => Some(f),
                _ => None,
            }),
        };
    }
    query
}

fn select_one(sql: &str) -> QueryAs<'_, Postgres, AnimeEntry, PgArguments> {
    sqlx::query_as::<_, AnimeEntry>(sql)
}

/// PostgreSQL implementation of [`EntryRepository`].
#[derive(Clone)]
pub struct PgAnimeRepository {
    pool: Pool<Postgres>,
}

impl PgAnimeRepository {
    /// Create a new PgAnimeRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryRepository for PgAnimeRepository {
    type Session = PgAnimeSession;

    async fn begin(&self) -> Result<PgAnimeSession> {
        let tx = self.pool.begin().await.map_err(Error::Database)?;
        debug!(subsystem = "db", component = "anime", op = "begin", "Opened session");
        Ok(PgAnimeSession { tx })
    }

    async fn get(&self, system_id: &str) -> Result<Option<AnimeEntry>> {
        let sql = select_sql("WHERE system_id = $1");
        select_one(&sql)
            .bind(system_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn list(&self) -> Result<Vec<AnimeEntry>> {
        let sql = select_sql("ORDER BY series_en NULLS LAST, series_season NULLS LAST");
        select_one(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

/// One transaction against `anime_library`.
///
/// Dropping the session without calling [`EntrySession::commit`] rolls the
/// transaction back.
pub struct PgAnimeSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl EntrySession for PgAnimeSession {
    async fn find(&mut self, system_id: &str) -> Result<Option<AnimeEntry>> {
        let sql = select_sql("WHERE system_id = $1");
        select_one(&sql)
            .bind(system_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(Error::Database)
    }

    async fn insert(&mut self, entry: &AnimeEntry) -> Result<()> {
        let sql = insert_sql();
        bind_entry(sqlx::query(&sql), entry)
            .execute(&mut *self.tx)
            .await
            .map_err(Error::Database)?;
        trace!(system_id = %entry.system_id, "Staged insert");
        Ok(())
    }

    async fn update(&mut self, entry: &AnimeEntry) -> Result<()> {
        let sql = update_sql();
        let result = bind_entry(sqlx::query(&sql), entry)
            .execute(&mut *self.tx)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("system_id {}", entry.system_id)));
        }
        trace!(system_id = %entry.system_id, "Staged update");
        Ok(())
    }

    async fn enrichment_candidates(&mut self) -> Result<Vec<AnimeEntry>> {
        let sql = select_sql(ENRICHMENT_FILTER);
        select_one(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(Error::Database)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(Error::Database)?;
        debug!(subsystem = "db", component = "anime", op = "commit", "Committed session");
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(Error::Database)?;
        debug!(subsystem = "db", component = "anime", op = "rollback", "Rolled back session");
        Ok(())
    }
}
