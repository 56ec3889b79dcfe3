//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    Channel, ChunkEntry, DigestResult, DomainError, Identity, ModelVerdict, RawMessage, RawReply,
};

/// Slack Web API gateway. The four operations the pipeline needs; the
/// concrete transport stays swappable and mockable behind this trait.
#[async_trait::async_trait]
pub trait SlackGateway: Send + Sync {
    /// List channels the credential is a member of, paging through opaque
    /// cursor tokens until exhausted.
    async fn list_channels(&self) -> Result<Vec<Channel>, DomainError>;

    /// Fetch substantive messages with timestamp >= `oldest` (epoch seconds),
    /// in the API's native order. Bot-authored and subtyped records (joins,
    /// edits) are excluded before mapping.
    async fn fetch_history(
        &self,
        channel_id: &str,
        oldest: i64,
    ) -> Result<Vec<RawMessage>, DomainError>;

    /// Fetch all replies to a thread, excluding the parent message. A thread
    /// deleted between listing and fetch yields an empty list, not an error.
    async fn fetch_thread_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
    ) -> Result<Vec<RawReply>, DomainError>;

    /// Look up a workspace member by opaque id.
    async fn lookup_identity(&self, user_id: &str) -> Result<Identity, DomainError>;
}

/// Classification model port. One request per chunk of messages.
#[async_trait::async_trait]
pub trait ModelPort: Send + Sync {
    /// Classify one chunk. Returns one verdict per answered message id; the
    /// caller decides what to do when ids are missing.
    async fn classify_chunk(&self, chunk: &[ChunkEntry]) -> Result<Vec<ModelVerdict>, DomainError>;
}

/// Export port. Push a finished digest to an external service (e.g. Notion).
///
/// Invoked only on explicit request; a failure here is reported and swallowed
/// at the orchestration layer, never invalidating the digest.
#[async_trait::async_trait]
pub trait ExportPort: Send + Sync {
    /// Push the digest. Returns a URL to the created resource.
    async fn push_digest(&self, digest: &DigestResult) -> Result<String, DomainError>;
}
