use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::instrument;

use polysub_core::{BlobKey, JobId};

use crate::error::{RepositoryError, RepositoryResult};
use crate::types::{ArtifactSlot, JobRecord, JobStatus};

/// Job Repository: mutated exclusively by the Scheduler and
/// Pipeline Driver via optimistic-concurrency, version-guarded updates so
/// only the worker that wins the CAS owns the job.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, record: JobRecord) -> RepositoryResult<()>;

    async fn get(&self, job_id: &JobId) -> RepositoryResult<JobRecord>;

    /// CAS-guarded status transition. Rejects the update if `expected_version`
    /// is stale or if the DAG forbids the transition.
    async fn update_status(
        &self,
        job_id: &JobId,
        expected_version: u64,
        status: JobStatus,
    ) -> RepositoryResult<JobRecord>;

    async fn set_duration_seconds(
        &self,
        job_id: &JobId,
        expected_version: u64,
        duration_seconds: u64,
    ) -> RepositoryResult<JobRecord>;

    async fn set_detected_language(
        &self,
        job_id: &JobId,
        expected_version: u64,
        language: String,
    ) -> RepositoryResult<JobRecord>;

    async fn set_artifact(
        &self,
        job_id: &JobId,
        expected_version: u64,
        slot: ArtifactSlot,
        key: BlobKey,
    ) -> RepositoryResult<JobRecord>;

    /// Clears an artifact key without touching the record's status, used by
    /// the cleaner after it deletes the underlying blob.
    async fn clear_artifact(&self, job_id: &JobId, slot: ArtifactSlot) -> RepositoryResult<()>;

    async fn list_terminal_before(&self, cutoff: chrono::DateTime<Utc>) -> Vec<JobRecord>;

    /// Every artifact key still owned by a non-terminal job, for the
    /// cleaner's "never deletes artifacts of jobs in non-terminal status"
    /// guard.
    async fn non_terminal_artifact_keys(&self) -> std::collections::HashSet<BlobKey>;

    /// Whether `job_id` is currently in a non-terminal status, used by the
    /// cleaner to protect in-flight scratch directories.
    async fn is_non_terminal(&self, job_id: &JobId) -> bool;
}

#[derive(Default)]
pub struct MemoryJobRepository {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl MemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn cas<F>(&self, job_id: &JobId, expected_version: u64, mutate: F) -> RepositoryResult<JobRecord>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut jobs = self.jobs.write();
        let record = jobs.get_mut(job_id).ok_or(RepositoryError::NotFound)?;
        if record.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                actual: record.version,
            });
        }
        mutate(record);
        record.version += 1;
        Ok(record.clone())
    }
}

#[async_trait]
impl JobRepository for MemoryJobRepository {
    #[instrument(skip(self, record), fields(job_id = %record.id))]
    async fn create(&self, record: JobRecord) -> RepositoryResult<()> {
        self.jobs.write().insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> RepositoryResult<JobRecord> {
        self.jobs.read().get(job_id).cloned().ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self), fields(%job_id, expected_version))]
    async fn update_status(
        &self,
        job_id: &JobId,
        expected_version: u64,
        status: JobStatus,
    ) -> RepositoryResult<JobRecord> {
        let mut jobs = self.jobs.write();
        let record = jobs.get_mut(job_id).ok_or(RepositoryError::NotFound)?;
        if record.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                actual: record.version,
            });
        }
        if !record.status.allows_transition_to(&status) {
            return Err(RepositoryError::IllegalTransition);
        }

        match &status {
            JobStatus::Processing => record.started_at = Some(Utc::now()),
            JobStatus::Completed { completed_at } => record.completed_at = Some(*completed_at),
            _ => {}
        }
        record.status = status;
        record.version += 1;
        Ok(record.clone())
    }

    async fn set_duration_seconds(
        &self,
        job_id: &JobId,
        expected_version: u64,
        duration_seconds: u64,
    ) -> RepositoryResult<JobRecord> {
        self.cas(job_id, expected_version, |record| {
            record.duration_seconds = Some(duration_seconds);
        })
    }

    async fn set_detected_language(
        &self,
        job_id: &JobId,
        expected_version: u64,
        language: String,
    ) -> RepositoryResult<JobRecord> {
        self.cas(job_id, expected_version, |record| {
            record.source_language = Some(language);
        })
    }

    async fn set_artifact(
        &self,
        job_id: &JobId,
        expected_version: u64,
        slot: ArtifactSlot,
        key: BlobKey,
    ) -> RepositoryResult<JobRecord> {
        self.cas(job_id, expected_version, |record| match slot {
            ArtifactSlot::Srt => record.artifacts.srt = Some(key),
            ArtifactSlot::Vtt => record.artifacts.vtt = Some(key),
            ArtifactSlot::Json => record.artifacts.json = Some(key),
            ArtifactSlot::SrtTranslated => record.artifacts.srt_t = Some(key),
            ArtifactSlot::VttTranslated => record.artifacts.vtt_t = Some(key),
        })
    }

    async fn clear_artifact(&self, job_id: &JobId, slot: ArtifactSlot) -> RepositoryResult<()> {
        let mut jobs = self.jobs.write();
        let record = jobs.get_mut(job_id).ok_or(RepositoryError::NotFound)?;
        match slot {
            ArtifactSlot::Srt => record.artifacts.srt = None,
            ArtifactSlot::Vtt => record.artifacts.vtt = None,
            ArtifactSlot::Json => record.artifacts.json = None,
            ArtifactSlot::SrtTranslated => record.artifacts.srt_t = None,
            ArtifactSlot::VttTranslated => record.artifacts.vtt_t = None,
        }
        Ok(())
    }

    async fn list_terminal_before(&self, cutoff: chrono::DateTime<Utc>) -> Vec<JobRecord> {
        self.jobs
            .read()
            .values()
            .filter(|record| {
                record.status.is_terminal()
                    && record.completed_at.or(record.started_at).unwrap_or(record.created_at) < cutoff
            })
            .cloned()
            .collect()
    }

    async fn non_terminal_artifact_keys(&self) -> std::collections::HashSet<BlobKey> {
        let mut keys = std::collections::HashSet::new();
        for record in self.jobs.read().values() {
            if record.status.is_terminal() {
                continue;
            }
            for key in [
                &record.artifacts.srt,
                &record.artifacts.vtt,
                &record.artifacts.json,
                &record.artifacts.srt_t,
                &record.artifacts.vtt_t,
            ]
            .into_iter()
            .flatten()
            {
                keys.insert(key.clone());
            }
        }
        keys
    }

    async fn is_non_terminal(&self, job_id: &JobId) -> bool {
        self.jobs.read().get(job_id).map(|record| !record.status.is_terminal()).unwrap_or(false)
    }
}
