// src/store/sqlite.rs

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::{
    error::AppError,
    models::attempt::TestAttempt,
    store::RecordStore,
};

const COLUMNS: &str = "id, subject, category, provider, max_marks, obtained_marks, percentage, \
correct_count, incorrect_count, not_attempted_count, test_rank, total_test_takers, \
rank_percentile, date, notes";

const INSERT_SQL: &str = "INSERT INTO attempts (id, subject, category, provider, max_marks, \
obtained_marks, percentage, correct_count, incorrect_count, not_attempted_count, test_rank, \
total_test_takers, rank_percentile, date, notes) \
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

fn insert_query(
    attempt: &TestAttempt,
) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(INSERT_SQL)
        .bind(&attempt.id)
        .bind(&attempt.subject)
        .bind(attempt.category)
        .bind(&attempt.provider)
        .bind(attempt.max_marks)
        .bind(attempt.obtained_marks)
        .bind(attempt.percentage)
        .bind(attempt.correct_count)
        .bind(attempt.incorrect_count)
        .bind(attempt.not_attempted_count)
        .bind(attempt.test_rank)
        .bind(attempt.total_test_takers)
        .bind(attempt.rank_percentile)
        .bind(attempt.date)
        .bind(&attempt.notes)
}

/// An id collision is the importer's mistake, not a server fault.
fn map_insert_error(e: sqlx::Error, id: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::BadRequest(format!("an attempt with id {id} already exists"))
        }
        _ => AppError::from(e),
    }
}

/// SQLite-backed [`RecordStore`]. Rows come back in insertion order so
/// the engine's stable date sort keeps same-date entries in the order
/// they were recorded.
pub struct SqliteStore {
    pool: SqlitePool,
    changes: broadcast::Sender<Vec<TestAttempt>>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self { pool, changes }
    }

    /// Broadcasts the full updated collection to subscribers, if any.
    async fn notify(&self) {
        if self.changes.receiver_count() == 0 {
            return;
        }
        match self.load_all().await {
            Ok(attempts) => {
                let _ = self.changes.send(attempts);
            }
            Err(e) => {
                tracing::error!("Failed to load attempts for change notification: {}", e);
            }
        }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn load_all(&self) -> Result<Vec<TestAttempt>, AppError> {
        let attempts = sqlx::query_as::<_, TestAttempt>(&format!(
            "SELECT {COLUMNS} FROM attempts ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    async fn insert(&self, attempt: &TestAttempt) -> Result<String, AppError> {
        insert_query(attempt)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, &attempt.id))?;

        self.notify().await;
        Ok(attempt.id.clone())
    }

    async fn insert_many(&self, attempts: &[TestAttempt]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for attempt in attempts {
            insert_query(attempt)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_insert_error(e, &attempt.id))?;
        }
        tx.commit().await?;

        self.notify().await;
        Ok(())
    }

    async fn update(&self, id: &str, attempt: &TestAttempt) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE attempts SET \
                subject = ?, category = ?, provider = ?, max_marks = ?, obtained_marks = ?, \
                percentage = ?, correct_count = ?, incorrect_count = ?, not_attempted_count = ?, \
                test_rank = ?, total_test_takers = ?, rank_percentile = ?, date = ?, notes = ? \
             WHERE id = ?",
        )
        .bind(&attempt.subject)
        .bind(attempt.category)
        .bind(&attempt.provider)
        .bind(attempt.max_marks)
        .bind(attempt.obtained_marks)
        .bind(attempt.percentage)
        .bind(attempt.correct_count)
        .bind(attempt.incorrect_count)
        .bind(attempt.not_attempted_count)
        .bind(attempt.test_rank)
        .bind(attempt.total_test_takers)
        .bind(attempt.rank_percentile)
        .bind(attempt.date)
        .bind(&attempt.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Attempt not found".to_string()));
        }

        self.notify().await;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM attempts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Attempt not found".to_string()));
        }

        self.notify().await;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<TestAttempt>> {
        self.changes.subscribe()
    }
}
