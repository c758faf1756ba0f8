use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

/// Errors raised while driving the worker pool.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("worker join error: {0}")]
    WorkerJoin(String),

    #[error("scheduler already shut down")]
    AlreadyShutDown,
}
