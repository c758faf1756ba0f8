use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use polysub_core::JobClass;

use crate::error::{QueueError, QueueResult};
use crate::priority_queue::PriorityQueue;
use crate::types::JobDescriptor;

/// What the pipeline driver reports back after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Completed,
    Failed,
    Cancelled,
}

/// The pipeline driver, invoked by the scheduler with a descriptor and a
/// cancellation handle. Implemented by `polysub-pipeline`.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, desc: JobDescriptor, cancel: CancellationToken) -> HandlerOutcome;
}

/// Per-class concurrency caps.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimits {
    pub priority: usize,
    pub paid: usize,
    pub free: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            priority: 8,
            paid: 4,
            free: 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub worker_count: usize,
    pub empty_poll_interval: Duration,
    pub limits: ConcurrencyLimits,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            empty_poll_interval: Duration::from_millis(100),
            limits: ConcurrencyLimits::default(),
        }
    }
}

struct Permits {
    priority: Arc<Semaphore>,
    paid: Arc<Semaphore>,
    free: Arc<Semaphore>,
}

impl Permits {
    fn for_class(&self, class: JobClass) -> &Arc<Semaphore> {
        match class {
            JobClass::Priority => &self.priority,
            JobClass::Paid => &self.paid,
            JobClass::Free => &self.free,
        }
    }
}

/// A pool of worker loops pulling from a [`PriorityQueue`].
pub struct Scheduler<H: JobHandler + 'static> {
    queue: Arc<PriorityQueue>,
    handler: Arc<H>,
    permits: Arc<Permits>,
    config: SchedulerConfig,
    shutdown: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl<H: JobHandler + 'static> Scheduler<H> {
    pub fn new(queue: Arc<PriorityQueue>, handler: H, config: SchedulerConfig) -> Self {
        let permits = Permits {
            priority: Arc::new(Semaphore::new(config.limits.priority)),
            paid: Arc::new(Semaphore::new(config.limits.paid)),
            free: Arc::new(Semaphore::new(config.limits.free)),
        };

        Self {
            queue,
            handler: Arc::new(handler),
            permits: Arc::new(permits),
            config,
            shutdown: CancellationToken::new(),
            workers: Vec::new(),
        }
    }

    /// Spawns `config.worker_count` worker loops.
    #[instrument(skip(self), fields(workers = self.config.worker_count))]
    pub fn start(&mut self) {
        for index in 0..self.config.worker_count {
            let queue = self.queue.clone();
            let handler = self.handler.clone();
            let permits = self.permits.clone();
            let shutdown = self.shutdown.clone();
            let poll_interval = self.config.empty_poll_interval;

            let worker = tokio::spawn(async move {
                info!(worker = index, "worker started");
                loop {
                    if shutdown.is_cancelled() {
                        break;
                    }

                    match queue.dequeue() {
                        None => {
                            tokio::select! {
                                _ = tokio::time::sleep(poll_interval) => {}
                                _ = shutdown.cancelled() => break,
                            }
                        }
                        Some(desc) => {
                            let class = desc.class();
                            let semaphore = permits.for_class(class);
                            let permit = match semaphore.clone().try_acquire_owned() {
                                Ok(permit) => permit,
                                Err(_) => {
                                    debug!(job_id = %desc.job_id, ?class, "no permit available, requeueing");
                                    queue.requeue_front(desc);
                                    tokio::time::sleep(poll_interval).await;
                                    continue;
                                }
                            };

                            let job_cancel = shutdown.child_token();
                            let job_id = desc.job_id.clone();
                            let outcome = handler.run(desc, job_cancel).await;
                            drop(permit);

                            match outcome {
                                HandlerOutcome::Completed => info!(%job_id, "job completed"),
                                HandlerOutcome::Failed => error!(%job_id, "job failed"),
                                HandlerOutcome::Cancelled => info!(%job_id, "job cancelled"),
                            }
                        }
                    }
                }
                info!(worker = index, "worker stopped");
            });

            self.workers.push(worker);
        }
    }

    /// Signals all workers to stop and waits for inflight jobs to finish
    ///.
    pub async fn shutdown(mut self) -> QueueResult<()> {
        self.shutdown.cancel();
        for worker in self.workers.drain(..) {
            worker.await.map_err(|e| QueueError::WorkerJoin(e.to_string()))?;
        }
        Ok(())
    }

    pub fn queue(&self) -> &Arc<PriorityQueue> {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polysub_core::{Plan, ReservationId, TenantId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct CountingHandler {
        runs: AtomicUsize,
        notify: Notify,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn run(&self, _desc: JobDescriptor, _cancel: CancellationToken) -> HandlerOutcome {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.notify.notify_one();
            HandlerOutcome::Completed
        }
    }

    #[tokio::test]
    async fn worker_drains_the_queue() {
        let queue = Arc::new(PriorityQueue::new());
        queue.enqueue(JobDescriptor::new(
            polysub_core::JobId::new(),
            TenantId::new("t"),
            Plan::Free,
            ReservationId::new(),
        ));

        let handler = CountingHandler {
            runs: AtomicUsize::new(0),
            notify: Notify::new(),
        };
        let mut scheduler = Scheduler::new(
            queue,
            handler,
            SchedulerConfig {
                worker_count: 1,
                empty_poll_interval: Duration::from_millis(5),
                limits: ConcurrencyLimits::default(),
            },
        );
        scheduler.start();
        scheduler.handler.notify.notified().await;
        assert_eq!(scheduler.handler.runs.load(Ordering::SeqCst), 1);
        scheduler.shutdown().await.unwrap();
    }
}
