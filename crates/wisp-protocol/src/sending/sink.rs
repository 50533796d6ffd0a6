use crate::raw::RawOutgoingMessage;

/// Where raw messages go once built: the storage-network client in
/// production, a recording mock in tests.
#[async_trait::async_trait]
pub trait RawMessageSink: Send + Sync {
    /// Store a message in the destination's mailbox.
    async fn store(&self, message: RawOutgoingMessage) -> Result<(), String>;
}

// ── MockSink (tests) ────────────────────────────────────────────────
