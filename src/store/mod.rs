// src/store/mod.rs

pub mod sqlite;

pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{error::AppError, models::attempt::TestAttempt};

/// The record store owns every persisted attempt; the engine only ever
/// sees immutable snapshots loaded through it.
///
/// `subscribe` is the realtime variant: after every mutation the full
/// updated collection is broadcast (no incremental deltas — collections
/// are small and a full reload keeps consumers trivial).
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<TestAttempt>, AppError>;

    /// Persists a new attempt and returns its id.
    async fn insert(&self, attempt: &TestAttempt) -> Result<String, AppError>;

    /// Persists a batch atomically: either every attempt is written or
    /// none are. Bulk imports go through this so a failure mid-batch
    /// can never leave unreported partial writes behind.
    async fn insert_many(&self, attempts: &[TestAttempt]) -> Result<(), AppError>;

    /// Full replace-on-edit. Fails with `NotFound` for an unknown id.
    async fn update(&self, id: &str, attempt: &TestAttempt) -> Result<(), AppError>;

    /// Hard delete. Fails with `NotFound` for an unknown id.
    async fn delete(&self, id: &str) -> Result<(), AppError>;

    fn subscribe(&self) -> broadcast::Receiver<Vec<TestAttempt>>;
}

pub type DynStore = Arc<dyn RecordStore>;
