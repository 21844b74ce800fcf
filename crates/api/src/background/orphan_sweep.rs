//! Periodic removal of orphaned artifacts.
//!
//! Settlement uploads the artifact before charging the credit and inserting
//! the result row, with no transaction spanning storage and the database. When
//! either later step fails the object stays in the processed bucket with no
//! row pointing at it. This task lists the bucket, and deletes objects older
//! than a grace period that no `processed_images` row references.
//!
//! The grace period keeps the sweep away from settlements still in flight.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fotoai_db::repositories::ProcessedImageRepo;
use fotoai_storage::{StorageClient, StorageEntry, StorageError};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Listing page size accepted by the storage API.
const PAGE_SIZE: u32 = 100;

const DEFAULT_INTERVAL_SECS: u64 = 3600;
const DEFAULT_GRACE_MINS: i64 = 60;

/// Sweep schedule.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub interval: Duration,
    /// Objects younger than this are never touched.
    pub grace: chrono::Duration,
    pub enabled: bool,
}

impl SweepConfig {
    /// Load the sweep schedule from environment variables.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `ORPHAN_SWEEP_INTERVAL_SECS` | `3600`  |
    /// | `ORPHAN_SWEEP_GRACE_MINS`    | `60`    |
    /// | `ORPHAN_SWEEP_ENABLED`       | `true`  |
    ///
    /// # Panics
    ///
    /// Panics if a variable is set but does not parse.
    pub fn from_env() -> Self {
        let interval_secs: u64 = std::env::var("ORPHAN_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_INTERVAL_SECS.to_string())
            .parse()
            .expect("ORPHAN_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(interval_secs > 0, "ORPHAN_SWEEP_INTERVAL_SECS must be positive");

        let grace_mins: i64 = std::env::var("ORPHAN_SWEEP_GRACE_MINS")
            .unwrap_or_else(|_| DEFAULT_GRACE_MINS.to_string())
            .parse()
            .expect("ORPHAN_SWEEP_GRACE_MINS must be a valid i64");

        let enabled: bool = std::env::var("ORPHAN_SWEEP_ENABLED")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("ORPHAN_SWEEP_ENABLED must be `true` or `false`");

        Self {
            interval: Duration::from_secs(interval_secs),
            grace: chrono::Duration::minutes(grace_mins),
            enabled,
        }
    }
}

/// Errors that abort one sweep pass. The loop logs them and tries again on
/// the next tick.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Objects old enough to be considered.
    pub candidates: usize,
    pub deleted: usize,
}

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(
    storage: StorageClient,
    pool: PgPool,
    config: SweepConfig,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = config.interval.as_secs(),
        grace_mins = config.grace.num_minutes(),
        bucket = storage.processed_bucket(),
        "Orphan sweep started"
    );

    let mut interval = tokio::time::interval(config.interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Orphan sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(&storage, &pool, config.grace, Utc::now()).await {
                    Ok(report) if report.deleted > 0 => {
                        tracing::info!(
                            candidates = report.candidates,
                            deleted = report.deleted,
                            "Orphan sweep: removed unreferenced artifacts"
                        );
                    }
                    Ok(report) => {
                        tracing::debug!(candidates = report.candidates, "Orphan sweep: nothing to remove");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Orphan sweep failed");
                    }
                }
            }
        }
    }
}

/// One pass over the processed bucket.
///
/// Artifacts live at `{user_id}/{file}`, so the pass walks the top-level
/// folders and checks each folder's old files against the database in one
/// query.
pub async fn sweep_once(
    storage: &StorageClient,
    pool: &PgPool,
    grace: chrono::Duration,
    now: DateTime<Utc>,
) -> Result<SweepReport, SweepError> {
    let bucket = storage.processed_bucket();
    let cutoff = now - grace;
    let mut report = SweepReport::default();

    let folders = list_all(storage, bucket, "").await?;
    for folder in folders.iter().filter(|entry| entry.is_folder()) {
        let files = list_all(storage, bucket, &folder.name).await?;
        let candidates = expired_paths(&folder.name, &files, cutoff);
        if candidates.is_empty() {
            continue;
        }
        report.candidates += candidates.len();

        let referenced: HashSet<String> = ProcessedImageRepo::referenced_paths(pool, &candidates)
            .await?
            .into_iter()
            .collect();
        let orphans: Vec<String> = candidates
            .into_iter()
            .filter(|path| !referenced.contains(path))
            .collect();
        if orphans.is_empty() {
            continue;
        }

        storage.remove(bucket, &orphans).await?;
        tracing::debug!(folder = %folder.name, removed = orphans.len(), "Orphan sweep: folder cleaned");
        report.deleted += orphans.len();
    }

    Ok(report)
}

async fn list_all(
    storage: &StorageClient,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<StorageEntry>, StorageError> {
    let mut entries = Vec::new();
    let mut offset = 0;
    loop {
        let page = storage.list(bucket, prefix, PAGE_SIZE, offset).await?;
        let len = page.len() as u32;
        entries.extend(page);
        if len < PAGE_SIZE {
            return Ok(entries);
        }
        offset += len;
    }
}

/// Full paths of files under `folder` created before `cutoff`.
///
/// Entries without a creation time are skipped rather than guessed at.
fn expired_paths(folder: &str, entries: &[StorageEntry], cutoff: DateTime<Utc>) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| !entry.is_folder())
        .filter(|entry| entry.created_at.is_some_and(|created| created < cutoff))
        .map(|entry| format!("{folder}/{}", entry.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, created_at: Option<DateTime<Utc>>) -> StorageEntry {
        StorageEntry {
            name: name.to_string(),
            id: Some(format!("id-{name}")),
            created_at,
        }
    }

    #[test]
    fn only_old_files_are_candidates() {
        let now = Utc::now();
        let cutoff = now - chrono::Duration::minutes(60);
        let entries = vec![
            file("old.png", Some(now - chrono::Duration::hours(3))),
            file("fresh.png", Some(now - chrono::Duration::minutes(5))),
            file("undated.png", None),
            StorageEntry {
                name: "nested".to_string(),
                id: None,
                created_at: None,
            },
        ];

        assert_eq!(expired_paths("user-1", &entries, cutoff), vec!["user-1/old.png"]);
    }
}
