/// Sending pipeline: build the raw message, then hand it to the transport.
///
/// Building and size checks happen synchronously on the caller's side, so
/// validation and encoding failures never reach the sink. The store step
/// runs as a keyed job: concurrent sends of the same message to the same
/// destination share one store. Failures are returned, never retried.
pub mod config;
pub mod sink;

pub use config::SenderConfig;
pub use sink::RawMessageSink;

use std::sync::Arc;

use wisp_queue::{JobError, KeyedJobQueue};

use crate::error::ProtocolError;
use crate::messages::ContentMessage;
use crate::raw::{to_raw_message, RawOutgoingMessage};
use crate::types::Namespace;

/// Why a send did not go through.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("encoded message is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },

    /// The sink refused the message.
    #[error("store failed: {0}")]
    Store(String),

    /// The store job did not settle normally.
    #[error(transparent)]
    Job(JobError),
}

impl From<JobError> for SendError {
    fn from(err: JobError) -> Self {
        match err.failure() {
            Some(reason) => SendError::Store(reason.to_string()),
            None => SendError::Job(err),
        }
    }
}

/// Sends messages through a [`RawMessageSink`].
pub struct MessageSender<S> {
    sink: Arc<S>,
    queue: KeyedJobQueue,
    config: SenderConfig,
}

impl<S: RawMessageSink + 'static> MessageSender<S> {
    pub fn new(sink: S, config: SenderConfig) -> Self {
        Self::with_queue(sink, config, KeyedJobQueue::new())
    }

    /// Use an existing queue, e.g. one shared with other senders.
    pub fn with_queue(sink: S, config: SenderConfig, queue: KeyedJobQueue) -> Self {
        Self {
            sink: Arc::new(sink),
            queue,
            config,
        }
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Build `message` for `destination` and store it under `namespace`.
    ///
    /// Returns the raw message that was stored. A send joining one already
    /// in flight for the same destination and identifier gets that send's
    /// result instead of storing again.
    pub async fn send<M>(
        &self,
        destination: &str,
        message: &M,
        namespace: Namespace,
    ) -> Result<RawOutgoingMessage, SendError>
    where
        M: ContentMessage + ?Sized,
    {
        let raw = to_raw_message(destination, message, namespace)?;
        let max = self.config.max_content_size;
        if raw.size() > max {
            tracing::warn!(
                destination,
                identifier = %raw.identifier,
                size = raw.size(),
                max,
                "message too large, not sending"
            );
            return Err(SendError::TooLarge {
                size: raw.size(),
                max,
            });
        }

        if !self.config.dedupe_in_flight {
            let result = store(Arc::clone(&self.sink), raw).await;
            return result.map_err(SendError::Store);
        }

        let key = job_key(destination, &raw.identifier);
        let sink = Arc::clone(&self.sink);
        self.queue
            .submit(key, move || store(sink, raw))
            .await
            .map_err(SendError::from)
    }

    /// Whether a send of `identifier` to `destination` is in flight.
    ///
    /// Always false when deduplication is disabled.
    pub fn is_sending(&self, destination: &str, identifier: &str) -> bool {
        self.queue.has(&job_key(destination, identifier))
    }
}

impl<S> std::fmt::Debug for MessageSender<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSender")
            .field("queue", &self.queue)
            .field("config", &self.config)
            .finish()
    }
}

fn job_key(destination: &str, identifier: &str) -> String {
    format!("{destination}:{identifier}")
}

async fn store<S: RawMessageSink + ?Sized>(
    sink: Arc<S>,
    raw: RawOutgoingMessage,
) -> Result<RawOutgoingMessage, String> {
    match sink.store(raw.clone()).await {
        Ok(()) => {
            tracing::debug!(
                destination = %raw.destination,
                identifier = %raw.identifier,
                namespace = %raw.namespace,
                size = raw.size(),
                "message stored"
            );
            Ok(raw)
        }
        Err(reason) => {
            tracing::warn!(
                destination = %raw.destination,
                identifier = %raw.identifier,
                "store failed: {reason}"
            );
            Err(reason)
        }
    }
}
