use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::debug;

use polysub_core::{JobClass, JobId};

use crate::types::{JobDescriptor, QueueLengths};

#[derive(Default)]
struct Lanes {
    priority: VecDeque<JobDescriptor>,
    paid: VecDeque<JobDescriptor>,
    free: VecDeque<JobDescriptor>,
}

impl Lanes {
    fn lane(&self, class: JobClass) -> &VecDeque<JobDescriptor> {
        match class {
            JobClass::Priority => &self.priority,
            JobClass::Paid => &self.paid,
            JobClass::Free => &self.free,
        }
    }

    fn lane_mut(&mut self, class: JobClass) -> &mut VecDeque<JobDescriptor> {
        match class {
            JobClass::Priority => &mut self.priority,
            JobClass::Paid => &mut self.paid,
            JobClass::Free => &mut self.free,
        }
    }
}

/// Three named FIFO lanes with strict-priority dequeue: paying
/// users are never starved by free, priority users never starved by paid.
/// A single shared lock gives atomicity across competing workers.
#[derive(Default)]
pub struct PriorityQueue {
    lanes: Mutex<Lanes>,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, desc: JobDescriptor) {
        let class = desc.class();
        debug!(job_id = %desc.job_id, ?class, "enqueued");
        self.lanes.lock().lane_mut(class).push_back(desc);
    }

    /// Returns a dequeued descriptor to the head of its class lane.
    pub fn requeue_front(&self, desc: JobDescriptor) {
        let class = desc.class();
        self.lanes.lock().lane_mut(class).push_front(desc);
    }

    /// Oldest entry in the highest-priority non-empty lane.
    pub fn dequeue(&self) -> Option<JobDescriptor> {
        let mut lanes = self.lanes.lock();
        for class in JobClass::all() {
            if let Some(desc) = lanes.lane_mut(*class).pop_front() {
                return Some(desc);
            }
        }
        None
    }

    /// 1-based position across all lanes at-or-above the job's own class.
    pub fn position_of(&self, job_id: &JobId) -> Option<usize> {
        let lanes = self.lanes.lock();
        let mut offset = 0usize;
        for class in JobClass::all() {
            let lane = lanes.lane(*class);
            if let Some(index) = lane.iter().position(|d| &d.job_id == job_id) {
                return Some(offset + index + 1);
            }
            offset += lane.len();
        }
        None
    }

    /// Removes the job wherever it sits; true if a removal occurred.
    pub fn cancel(&self, job_id: &JobId) -> bool {
        let mut lanes = self.lanes.lock();
        for class in JobClass::all() {
            let lane = lanes.lane_mut(*class);
            if let Some(index) = lane.iter().position(|d| &d.job_id == job_id) {
                lane.remove(index);
                return true;
            }
        }
        false
    }

    pub fn lengths(&self) -> QueueLengths {
        let lanes = self.lanes.lock();
        QueueLengths {
            priority: lanes.priority.len(),
            paid: lanes.paid.len(),
            free: lanes.free.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polysub_core::{Plan, ReservationId, TenantId};

    fn desc(plan: Plan) -> JobDescriptor {
        JobDescriptor::new(JobId::new(), TenantId::new("t"), plan, ReservationId::new())
    }

    #[test]
    fn strict_priority_dequeue_order() {
        let q = PriorityQueue::new();
        let free = desc(Plan::Free);
        let paid = desc(Plan::Pro);
        let priority = desc(Plan::Enterprise);

        q.enqueue(free.clone());
        q.enqueue(paid.clone());
        q.enqueue(priority.clone());

        assert_eq!(q.dequeue().unwrap().job_id, priority.job_id);
        assert_eq!(q.dequeue().unwrap().job_id, paid.job_id);
        assert_eq!(q.dequeue().unwrap().job_id, free.job_id);
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn fifo_within_a_class() {
        let q = PriorityQueue::new();
        let first = desc(Plan::Free);
        let second = desc(Plan::Free);
        q.enqueue(first.clone());
        q.enqueue(second.clone());
        assert_eq!(q.dequeue().unwrap().job_id, first.job_id);
        assert_eq!(q.dequeue().unwrap().job_id, second.job_id);
    }

    #[test]
    fn cancel_removes_from_wherever_it_sits() {
        let q = PriorityQueue::new();
        let paid = desc(Plan::Starter);
        q.enqueue(paid.clone());
        assert!(q.cancel(&paid.job_id));
        assert!(!q.cancel(&paid.job_id));
        assert_eq!(q.lengths(), QueueLengths::default());
    }

    #[test]
    fn position_of_counts_higher_classes_first() {
        let q = PriorityQueue::new();
        let priority = desc(Plan::Premium);
        let paid_first = desc(Plan::Pro);
        let paid_second = desc(Plan::Starter);
        q.enqueue(priority);
        q.enqueue(paid_first.clone());
        q.enqueue(paid_second.clone());

        assert_eq!(q.position_of(&paid_first.job_id), Some(2));
        assert_eq!(q.position_of(&paid_second.job_id), Some(3));
    }

    #[test]
    fn lengths_reports_per_class_sizes() {
        let q = PriorityQueue::new();
        q.enqueue(desc(Plan::Free));
        q.enqueue(desc(Plan::Pro));
        q.enqueue(desc(Plan::Enterprise));
        assert_eq!(
            q.lengths(),
            QueueLengths { priority: 1, paid: 1, free: 1 }
        );
    }
}
