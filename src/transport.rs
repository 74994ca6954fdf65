use crate::error::Result;
use crate::types::conversation::Conversation;
use async_trait::async_trait;
use std::collections::HashMap;

/// Authoritative per-conversation seq pair held by the server: the highest
/// assigned message seq and the logged-in user's own read position.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasReadAndMaxSeq {
    pub max_seq: i64,
    pub has_read_seq: i64,
}

/// One participant's read position as reported by the server.
#[derive(Debug, Clone)]
pub struct ServerReadCursor {
    pub user_id: String,
    pub max_read_seq: i64,
}

/// The server's cursor set for one conversation.
#[derive(Debug, Clone)]
pub struct ConversationReadCursors {
    pub conversation_id: String,
    pub cursors: Vec<ServerReadCursor>,
}

/// Request/response surface of the read-state server endpoints. The
/// transport layer owns connection management, retries and timeouts;
/// implementations map aborted calls to [`crate::error::CoreError::Cancelled`]
/// and everything else to `Transport`.
#[async_trait]
pub trait ServerApi: Send + Sync {
    /// Per-conversation (max seq, has-read seq) pairs for the logged-in
    /// user, covering every conversation the server knows about.
    async fn get_conversations_has_read_and_max_seq(
        &self,
    ) -> Result<HashMap<String, HasReadAndMaxSeq>>;

    /// Authoritative cursor sets for the given conversations.
    async fn get_conversation_read_cursors(
        &self,
        conversation_ids: &[String],
    ) -> Result<Vec<ConversationReadCursors>>;

    /// Moves the user's read position for a whole conversation. `seqs`
    /// lists the individually flagged messages for single chats and is
    /// empty for group and notification conversations.
    async fn mark_conversation_as_read(
        &self,
        conversation_id: &str,
        has_read_seq: i64,
        seqs: &[i64],
    ) -> Result<()>;

    /// Flags specific messages read.
    async fn mark_messages_as_read(&self, conversation_id: &str, seqs: &[i64]) -> Result<()>;

    /// Server-side catalogue fetch for conversations unknown locally.
    async fn get_conversations_by_ids(
        &self,
        conversation_ids: &[String],
    ) -> Result<Vec<Conversation>>;
}
