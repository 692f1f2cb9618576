//! Background image jobs: promotion from temporary storage and deletion.
//!
//! Each job runs with a fixed retry budget. Final failures are logged and dropped;
//! the request that enqueued the job has already answered 202.

use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, bail};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    clients::storage::ObjectStorage,
    entity::{
        images::{Column as ImageCol, Entity as Images},
        sea_orm_active_enums::ImageStatus,
    },
};

#[derive(Debug, Clone)]
pub enum ImageJob {
    Promote {
        image_id: Uuid,
        temp_path: PathBuf,
        key: String,
        content_type: String,
    },
    Delete {
        image_ids: Vec<Uuid>,
        keys: Vec<String>,
    },
}

impl ImageJob {
    fn name(&self) -> &'static str {
        match self {
            ImageJob::Promote { .. } => "promote_image",
            ImageJob::Delete { .. } => "delete_images",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total tries. Only `attempts - 1` waits happen, so with the default three tries
    /// the 60s entry is never reached.
    pub attempts: u32,
    /// Delay before attempt `n + 1`; the last entry repeats if attempts outnumber it.
    pub backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: vec![
                Duration::from_secs(10),
                Duration::from_secs(30),
                Duration::from_secs(60),
            ],
        }
    }
}

impl RetryPolicy {
    /// Same budget with no waiting between attempts.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            backoff: Vec::new(),
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        let idx = attempt.saturating_sub(1) as usize;
        self.backoff
            .get(idx)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

/// Runs `op` until it succeeds or the policy's attempts are used up.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, job: &str, mut op: F) -> anyhow::Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(job, attempt, error = %err, retry_in_s = delay.as_secs(), "job attempt failed");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Executes image jobs against the database and the object store.
#[derive(Clone)]
pub struct ImageWorker {
    orm: DatabaseConnection,
    storage: Arc<dyn ObjectStorage>,
    policy: RetryPolicy,
}

impl ImageWorker {
    pub fn new(orm: DatabaseConnection, storage: Arc<dyn ObjectStorage>, policy: RetryPolicy) -> Self {
        Self {
            orm,
            storage,
            policy,
        }
    }

    /// Runs one job to completion including retries. Returns whether it finally succeeded.
    pub async fn handle(&self, job: ImageJob) -> bool {
        let name = job.name();
        let result = run_with_retry(&self.policy, name, |_| self.run_once(&job)).await;
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(job = name, error = ?err, "job failed permanently");
                false
            }
        }
    }

    async fn run_once(&self, job: &ImageJob) -> anyhow::Result<()> {
        match job {
            ImageJob::Promote {
                image_id,
                temp_path,
                key,
                content_type,
            } => self.promote(*image_id, temp_path, key, content_type).await,
            ImageJob::Delete { image_ids, keys } => self.delete(image_ids, keys).await,
        }
    }

    async fn promote(
        &self,
        image_id: Uuid,
        temp_path: &Path,
        key: &str,
        content_type: &str,
    ) -> anyhow::Result<()> {
        let image = Images::find_by_id(image_id).one(&self.orm).await?;
        let pending = matches!(&image, Some(img) if img.status == ImageStatus::PendingUpload);
        if !pending {
            // already promoted, or deleted before the upload ran
            remove_temp(temp_path).await;
            return Ok(());
        }

        let bytes = match tokio::fs::read(temp_path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                bail!("temporary file not found: {}", temp_path.display())
            }
            Err(err) => return Err(err).context("reading temporary upload"),
        };

        self.storage.put(key, bytes, content_type).await?;

        let updated = Images::update_many()
            .col_expr(ImageCol::Status, Expr::value(ImageStatus::Committed))
            .col_expr(ImageCol::UpdatedAt, Expr::value(Utc::now()))
            .filter(ImageCol::Id.eq(image_id))
            .filter(ImageCol::Status.eq(ImageStatus::PendingUpload))
            .exec(&self.orm)
            .await?;

        if updated.rows_affected == 0 {
            // the row was marked for deletion while the bytes were in flight
            self.storage.delete(key).await?;
        }

        remove_temp(temp_path).await;
        tracing::info!(%image_id, key, "image uploaded to object storage");
        Ok(())
    }

    async fn delete(&self, image_ids: &[Uuid], keys: &[String]) -> anyhow::Result<()> {
        for key in keys {
            if self.storage.delete(key).await? {
                tracing::info!(key = %key, "image deleted from object storage");
            } else {
                tracing::warn!(key = %key, "image not found in object storage");
            }
        }

        Images::delete_many()
            .filter(ImageCol::Id.is_in(image_ids.iter().copied()))
            .filter(ImageCol::Status.eq(ImageStatus::PendingDelete))
            .exec(&self.orm)
            .await?;
        Ok(())
    }
}

async fn remove_temp(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %err, "could not remove temporary upload");
        }
    }
}

/// Handle for enqueueing jobs onto the background worker.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<ImageJob>,
}

impl JobQueue {
    /// Spawns the dispatcher loop; every received job runs on its own task so a
    /// backing-off job never delays the others.
    pub fn start(worker: ImageWorker) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ImageJob>();
        tokio::spawn(async move {
            tracing::info!("image job worker started");
            while let Some(job) = rx.recv().await {
                let worker = worker.clone();
                tokio::spawn(async move {
                    worker.handle(job).await;
                });
            }
            tracing::info!("image job channel closed, worker stopping");
        });
        Self { tx }
    }

    pub fn dispatch(&self, job: ImageJob) -> anyhow::Result<()> {
        self.tx
            .send(job)
            .map_err(|err| anyhow::anyhow!("job queue is closed, dropped {}", err.0.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn default_policy_matches_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(10));
        assert_eq!(policy.delay_after(2), Duration::from_secs(30));
        assert_eq!(policy.delay_after(3), Duration::from_secs(60));
        assert_eq!(policy.delay_after(7), Duration::from_secs(60));
        assert_eq!(RetryPolicy::immediate(3).delay_after(1), Duration::ZERO);
    }

    #[tokio::test]
    async fn retry_stops_after_budget() {
        let calls = AtomicU32::new(0);
        let result: anyhow::Result<()> = run_with_retry(&RetryPolicy::immediate(3), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { bail!("storage unavailable") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_returns_first_success() {
        let result = run_with_retry(&RetryPolicy::immediate(3), "test", |attempt| async move {
            if attempt < 2 {
                bail!("transient")
            }
            Ok(attempt)
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_between_attempts() {
        let started = tokio::time::Instant::now();
        let _ = run_with_retry(&RetryPolicy::default(), "test", |_| async {
            Err::<(), _>(anyhow::anyhow!("down"))
        })
        .await;
        assert_eq!(started.elapsed(), Duration::from_secs(40));
    }
}
