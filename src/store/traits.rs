use crate::store::error::Result;
use crate::types::conversation::Conversation;
use crate::types::cursor::{ReadCursor, ReadState};
use crate::types::message::Message;
use async_trait::async_trait;

/// Storage contract for read cursors and the per-conversation derived read
/// state.
///
/// Implementations keep both tables under one reader-writer lock: writes and
/// the aggregate scan are serialised against each other, while lookups may
/// run concurrently when no writer holds the lock.
#[async_trait]
pub trait ReadStore: Send + Sync {
    /// Returns [`crate::store::error::StoreError::NotFound`] when the user
    /// has no cursor in the conversation.
    async fn get_read_cursor(&self, conversation_id: &str, user_id: &str) -> Result<ReadCursor>;

    /// Atomic insert-or-update on the (conversation, user) key. Overwrites
    /// the stored seq unconditionally; monotonicity is enforced by the
    /// caller before it gets here.
    async fn upsert_read_cursor(&self, cursor: ReadCursor) -> Result<()>;

    async fn delete_read_cursor(&self, conversation_id: &str, user_id: &str) -> Result<()>;

    async fn read_cursors(&self, conversation_id: &str) -> Result<Vec<ReadCursor>>;

    async fn delete_all_read_cursors(&self, conversation_id: &str) -> Result<()>;

    /// Returns [`crate::store::error::StoreError::NotFound`] when the
    /// conversation has no derived row yet.
    async fn get_read_state(&self, conversation_id: &str) -> Result<ReadState>;

    async fn upsert_read_state(&self, state: ReadState) -> Result<()>;

    async fn delete_read_state(&self, conversation_id: &str) -> Result<()>;

    /// MIN(max_read_seq) over the conversation's cursors where
    /// user != `exclude_user_id`, or 0 when no such rows exist. Runs as a
    /// single scan or query, never by iterating rows on the caller's side.
    async fn all_read_seq_excluding(
        &self,
        conversation_id: &str,
        exclude_user_id: &str,
    ) -> Result<i64>;
}

/// Chat-log accessors the read-state core needs. The message pipeline owns
/// the rows; the core only flips read flags and reads sequence bounds.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn get_message_by_seq(&self, conversation_id: &str, seq: i64) -> Result<Message>;

    /// Returns the messages that exist among `seqs`; unknown seqs are
    /// silently absent from the result.
    async fn get_messages_by_seqs(&self, conversation_id: &str, seqs: &[i64]) -> Result<Vec<Message>>;

    async fn get_messages_by_client_msg_ids(
        &self,
        conversation_id: &str,
        client_msg_ids: &[String],
    ) -> Result<Vec<Message>>;

    async fn get_unread_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    async fn update_message(&self, conversation_id: &str, message: &Message) -> Result<()>;

    /// Returns the number of rows actually flipped to read.
    async fn mark_messages_read_by_ids(
        &self,
        conversation_id: &str,
        client_msg_ids: &[String],
    ) -> Result<i64>;

    async fn mark_messages_read_by_seqs(&self, conversation_id: &str, seqs: &[i64]) -> Result<i64>;

    /// Highest server seq of any sequenced message in the conversation, or 0
    /// when there is none.
    async fn max_msg_seq(&self, conversation_id: &str) -> Result<i64>;

    /// Highest server seq among messages not sent by `self_user_id`, or 0.
    async fn peer_max_msg_seq(&self, conversation_id: &str, self_user_id: &str) -> Result<i64>;
}

/// Conversation-catalogue accessors the read-state core needs.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation>;

    async fn get_all_conversations(&self) -> Result<Vec<Conversation>>;

    async fn set_unread_count(&self, conversation_id: &str, unread_count: i32) -> Result<()>;

    /// Decrements the unread counter, clamping at zero.
    async fn decr_unread_count(&self, conversation_id: &str, count: i64) -> Result<()>;

    async fn update_latest_message(&self, conversation_id: &str, latest_msg: &str) -> Result<()>;

    async fn batch_insert_conversations(&self, conversations: Vec<Conversation>) -> Result<()>;
}

/// Group-membership cache accessor.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn group_member_ids(&self, group_id: &str) -> Result<Vec<String>>;
}

/// The full storage surface the core runs against. Blanket-implemented so
/// any backend providing the four stores qualifies.
pub trait Backend: ReadStore + MessageStore + ConversationStore + GroupStore + Send + Sync {}

impl<T> Backend for T where T: ReadStore + MessageStore + ConversationStore + GroupStore + Send + Sync {}
