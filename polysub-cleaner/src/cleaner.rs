use std::sync::Arc;
use std::time::SystemTime;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use polysub_blob::BlobAdapter;
use polysub_core::JobId;
use polysub_pipeline::JobRepository;

use crate::config::CleanerConfig;

/// Counts from one sweep, returned for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub blobs_deleted: usize,
    pub blobs_protected: usize,
    pub scratch_dirs_deleted: usize,
}

/// Cadence-driven purge of expired blobs and orphaned job-scratch
/// directories. Safe to run concurrently with active jobs: it
/// never deletes an artifact still owned by a non-terminal job.
pub struct Cleaner {
    blobs: Arc<BlobAdapter>,
    repository: Arc<dyn JobRepository>,
    config: CleanerConfig,
}

impl Cleaner {
    pub fn new(blobs: Arc<BlobAdapter>, repository: Arc<dyn JobRepository>, config: CleanerConfig) -> Self {
        Self { blobs, repository, config }
    }

    /// Runs one sweep: expired blobs first, then orphaned scratch directories.
    #[instrument(skip(self))]
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let protected = self.repository.non_terminal_artifact_keys().await;
        let ttl = chrono::Duration::hours(self.blobs.config().artifact_ttl_hours as i64);
        let cutoff = Utc::now() - ttl;
        let candidates = match self.blobs.list_older_than(cutoff).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(%err, "could not list expired blobs");
                return report;
            }
        };

        for key in candidates {
            if protected.contains(&key) {
                report.blobs_protected += 1;
                continue;
            }
            match self.blobs.delete(&key).await {
                Ok(()) => {
                    debug!(%key, "deleted expired blob");
                    report.blobs_deleted += 1;
                }
                Err(err) => warn!(%key, %err, "failed to delete expired blob"),
            }
        }

        report.scratch_dirs_deleted = self.sweep_scratch().await;
        info!(?report, "cleaner sweep finished");
        report
    }

    async fn sweep_scratch(&self) -> usize {
        let mut deleted = 0;
        let mut entries = match tokio::fs::read_dir(&self.config.scratch_dir).await {
            Ok(entries) => entries,
            Err(err) => {
                debug!(%err, "scratch directory unreadable, skipping sweep");
                return 0;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    warn!(%err, "error walking scratch directory");
                    break;
                }
            };

            let Ok(metadata) = entry.metadata().await else { continue };
            if !metadata.is_dir() {
                continue;
            }

            let age = metadata.modified().ok().and_then(|modified| SystemTime::now().duration_since(modified).ok());
            let Some(age) = age else { continue };
            if age < self.config.scratch_ttl {
                continue;
            }

            let job_id = JobId::from_string(entry.file_name().to_string_lossy().into_owned());
            if self.repository.is_non_terminal(&job_id).await {
                continue;
            }

            if tokio::fs::remove_dir_all(entry.path()).await.is_ok() {
                deleted += 1;
            }
        }

        deleted
    }

    /// Runs `sweep` on `config.cadence` until the process exits. Intended to
    /// be spawned as a background task by the CLI's `clean`/`serve` commands.
    pub async fn run_forever(&self) -> ! {
        let mut interval = tokio::time::interval(self.config.cadence);
        loop {
            interval.tick().await;
            self.sweep().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polysub_blob::{BlobConfig, BlobKind, MemoryBlobStore};
    use polysub_core::{Plan, ReservationId, TenantId};
    use polysub_pipeline::{ArtifactSlot, JobKind, JobRecord, JobStatus, MemoryJobRepository};
    use std::time::Duration;

    fn sample_record(status: JobStatus) -> JobRecord {
        let mut record = JobRecord::new(
            JobId::new(),
            TenantId::new("acme"),
            Plan::Free,
            JobKind::Upload,
            "uploads/clip.mp4",
            None,
            false,
            ReservationId::new(),
        );
        record.status = status;
        record
    }

    #[tokio::test]
    async fn sweep_skips_artifacts_of_non_terminal_jobs() {
        let blobs = Arc::new(BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::default().with_artifact_ttl_hours(0)));
        let path = std::env::temp_dir().join("polysub-cleaner-test-clip.wav");
        tokio::fs::write(&path, b"pcm").await.unwrap();
        let tenant = TenantId::new("acme");
        let receipt = blobs.put(&path, &tenant, BlobKind::Audio, None).await.unwrap();
        tokio::fs::remove_file(&path).await.ok();

        let repository: Arc<dyn JobRepository> = Arc::new(MemoryJobRepository::new());
        let mut record = sample_record(JobStatus::Extracting);
        let job_id = record.id.clone();
        record.artifacts.srt = Some(receipt.key.clone());
        repository.create(record).await.unwrap();
        repository
            .set_artifact(&job_id, 0, ArtifactSlot::Srt, receipt.key.clone())
            .await
            .unwrap();

        let cleaner = Cleaner::new(blobs, repository, CleanerConfig::default());
        let report = cleaner.sweep().await;
        assert_eq!(report.blobs_deleted, 0);
        assert_eq!(report.blobs_protected, 1);
    }

    #[tokio::test]
    async fn sweep_deletes_artifacts_of_terminal_jobs() {
        let blobs = Arc::new(BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::default().with_artifact_ttl_hours(0)));
        let path = std::env::temp_dir().join("polysub-cleaner-test-clip2.wav");
        tokio::fs::write(&path, b"pcm").await.unwrap();
        let tenant = TenantId::new("acme");
        let receipt = blobs.put(&path, &tenant, BlobKind::Audio, None).await.unwrap();
        tokio::fs::remove_file(&path).await.ok();

        let repository: Arc<dyn JobRepository> = Arc::new(MemoryJobRepository::new());
        let record = sample_record(JobStatus::Completed { completed_at: Utc::now() });
        repository.create(record).await.unwrap();

        let cleaner = Cleaner::new(blobs, repository, CleanerConfig::default());
        let report = cleaner.sweep().await;
        assert_eq!(report.blobs_deleted, 1);
    }

    #[tokio::test]
    async fn scratch_sweep_removes_only_aged_and_terminal_dirs() {
        let scratch_dir = std::env::temp_dir().join(format!("polysub-cleaner-scratch-{}", JobId::new()));
        tokio::fs::create_dir_all(&scratch_dir).await.unwrap();

        let repository: Arc<dyn JobRepository> = Arc::new(MemoryJobRepository::new());
        let record = sample_record(JobStatus::Completed { completed_at: Utc::now() });
        let job_id = record.id.clone();
        repository.create(record).await.unwrap();

        let job_dir = scratch_dir.join(job_id.as_str());
        tokio::fs::create_dir_all(&job_dir).await.unwrap();

        let blobs = Arc::new(BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::default()));
        let cleaner = Cleaner::new(
            blobs,
            repository,
            CleanerConfig {
                cadence: Duration::from_secs(3600),
                scratch_ttl: Duration::from_secs(0),
                scratch_dir: scratch_dir.clone(),
            },
        );

        let deleted = cleaner.sweep_scratch().await;
        assert_eq!(deleted, 1);
        assert!(!job_dir.exists());

        tokio::fs::remove_dir_all(&scratch_dir).await.ok();
    }
}
