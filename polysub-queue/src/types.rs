use chrono::{DateTime, Utc};

use polysub_core::{JobClass, JobId, Plan, ReservationId, TenantId};

/// Everything the scheduler needs to hand a job to the pipeline driver
///, without pulling in the full job record.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub job_id: JobId,
    pub tenant_id: TenantId,
    pub plan: Plan,
    pub reservation_id: ReservationId,
    pub enqueued_at: DateTime<Utc>,
}

impl JobDescriptor {
    pub fn new(job_id: JobId, tenant_id: TenantId, plan: Plan, reservation_id: ReservationId) -> Self {
        Self {
            job_id,
            tenant_id,
            plan,
            reservation_id,
            enqueued_at: Utc::now(),
        }
    }

    pub fn class(&self) -> JobClass {
        self.plan.class()
    }
}

/// Per-class queue sizes, as returned by `lengths()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueLengths {
    pub priority: usize,
    pub paid: usize,
    pub free: usize,
}
