use std::error::Error;
use std::sync::Arc;

/// Failure delivered to every caller awaiting a job.
///
/// Cloneable so a single settled job can hand the same error to all
/// deduplicated waiters.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobError {
    /// The work function returned an error. Shared verbatim by all waiters.
    #[error("job failed: {0}")]
    Failed(Arc<dyn Error + Send + Sync>),

    #[error("job '{key}' panicked")]
    Panicked { key: String },

    /// The runtime dropped the job before it settled.
    #[error("job '{key}' was cancelled before completion")]
    Cancelled { key: String },

    /// A caller joined an in-flight key expecting a different result type.
    #[error("job '{key}' is already running with a different result type")]
    TypeMismatch { key: String },
}

impl JobError {
    pub(crate) fn failed<E>(err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let boxed: Box<dyn Error + Send + Sync> = err.into();
        JobError::Failed(Arc::from(boxed))
    }

    /// The error returned by the work function, if that is why the job failed.
    ///
    /// Use `downcast_ref` on the result to recover the concrete error type.
    pub fn failure(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            JobError::Failed(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
