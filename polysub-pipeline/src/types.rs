use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use polysub_core::{BlobKey, JobId, PipelineErrorKind, Plan, ReservationId, TenantId};

/// How the job's source media was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    Upload,
    Url,
}

/// Status DAG:
/// `queued -> processing -> extracting -> transcribing -> {emitting, translating}`,
/// `translating -> emitting -> completed`, any non-terminal -> `failed | cancelled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Processing,
    Extracting,
    Transcribing,
    Translating,
    Emitting,
    Completed { completed_at: DateTime<Utc> },
    Failed { kind: PipelineErrorKind, message: String, failed_at: DateTime<Utc> },
    Cancelled { cancelled_at: DateTime<Utc> },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. } | JobStatus::Cancelled { .. })
    }

    /// Whether a transition from `self` to `next` is legal under the DAG.
    /// Any non-terminal state may fail or be cancelled at any time.
    pub fn allows_transition_to(&self, next: &JobStatus) -> bool {
        use JobStatus::*;
        if self.is_terminal() {
            return false;
        }
        match next {
            Failed { .. } | Cancelled { .. } => true,
            Processing => matches!(self, Queued),
            Extracting => matches!(self, Processing),
            Transcribing => matches!(self, Extracting),
            Translating => matches!(self, Transcribing),
            Emitting => matches!(self, Transcribing | Translating),
            Completed { .. } => matches!(self, Emitting),
            Queued => false,
        }
    }
}

/// Per-format artifact keys. `srt_t`/`vtt_t` are the
/// translated-stream counterparts, populated only when translation ran.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactKeys {
    pub srt: Option<BlobKey>,
    pub vtt: Option<BlobKey>,
    pub json: Option<BlobKey>,
    pub srt_t: Option<BlobKey>,
    pub vtt_t: Option<BlobKey>,
}

/// Which artifact slot a stage is writing (used by the repository's
/// targeted update so callers don't have to round-trip the whole record).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSlot {
    Srt,
    Vtt,
    Json,
    SrtTranslated,
    VttTranslated,
}

/// A job record. Mutated exclusively by the Scheduler and
/// Pipeline Driver; immutable once `status.is_terminal()` except for the
/// cleaner's TTL-driven artifact-key removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub tenant_id: TenantId,
    pub plan: Plan,
    pub kind: JobKind,
    pub source_handle: String,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub translate: bool,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u64>,
    pub artifacts: ArtifactKeys,
    pub reservation_id: ReservationId,
    /// Optimistic-concurrency version, bumped on every mutation.
    pub version: u64,
}

impl JobRecord {
    pub fn new(
        id: JobId,
        tenant_id: TenantId,
        plan: Plan,
        kind: JobKind,
        source_handle: impl Into<String>,
        target_language: Option<String>,
        translate: bool,
        reservation_id: ReservationId,
    ) -> Self {
        Self {
            id,
            tenant_id,
            plan,
            kind,
            source_handle: source_handle.into(),
            source_language: None,
            target_language,
            translate,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            duration_seconds: None,
            artifacts: ArtifactKeys::default(),
            reservation_id,
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dag_forbids_skipping_extraction() {
        assert!(!JobStatus::Processing.allows_transition_to(&JobStatus::Transcribing));
        assert!(JobStatus::Processing.allows_transition_to(&JobStatus::Extracting));
    }

    #[test]
    fn emitting_reachable_from_transcribing_or_translating() {
        assert!(JobStatus::Transcribing.allows_transition_to(&JobStatus::Emitting));
        assert!(JobStatus::Translating.allows_transition_to(&JobStatus::Emitting));
    }

    #[test]
    fn terminal_states_allow_no_further_transitions() {
        let completed = JobStatus::Completed { completed_at: Utc::now() };
        assert!(!completed.allows_transition_to(&JobStatus::Emitting));
        assert!(!completed.allows_transition_to(&JobStatus::Cancelled { cancelled_at: Utc::now() }));
    }

    #[test]
    fn any_non_terminal_state_may_fail_or_cancel() {
        assert!(JobStatus::Extracting.allows_transition_to(&JobStatus::Failed {
            kind: PipelineErrorKind::ExtractionFailed,
            message: "boom".into(),
            failed_at: Utc::now(),
        }));
        assert!(JobStatus::Queued.allows_transition_to(&JobStatus::Cancelled { cancelled_at: Utc::now() }));
    }
}
