use crate::store::error::{Result, StoreError};
use crate::store::traits::{ConversationStore, GroupStore, MessageStore, ReadStore};
use crate::types::conversation::Conversation;
use crate::types::cursor::{ReadCursor, ReadState};
use crate::types::message::Message;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    /// (conversation_id, user_id) -> max_read_seq
    cursors: HashMap<(String, String), i64>,
    /// conversation_id -> all_read_seq
    read_states: HashMap<String, i64>,
    /// conversation_id -> chat log
    messages: HashMap<String, Vec<Message>>,
    conversations: HashMap<String, Conversation>,
    /// group_id -> member user ids
    group_members: HashMap<String, Vec<String>>,
}

/// In-memory storage backend.
///
/// All tables live behind a single reader-writer lock, so every write and
/// the aggregate scan are serialised while plain lookups run concurrently.
/// Used by the test suites and by embedders that do not persist read state
/// across restarts.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_conversation(&self, conversation: Conversation) {
        let mut tables = self.tables.write().await;
        tables
            .conversations
            .insert(conversation.conversation_id.clone(), conversation);
    }

    pub async fn put_message(&self, conversation_id: &str, message: Message) {
        let mut tables = self.tables.write().await;
        tables
            .messages
            .entry(conversation_id.to_string())
            .or_default()
            .push(message);
    }

    pub async fn put_group_members(&self, group_id: &str, member_ids: Vec<String>) {
        let mut tables = self.tables.write().await;
        tables.group_members.insert(group_id.to_string(), member_ids);
    }
}

#[async_trait]
impl ReadStore for MemoryStore {
    async fn get_read_cursor(&self, conversation_id: &str, user_id: &str) -> Result<ReadCursor> {
        let tables = self.tables.read().await;
        let key = (conversation_id.to_string(), user_id.to_string());
        match tables.cursors.get(&key) {
            Some(&max_read_seq) => Ok(ReadCursor {
                conversation_id: conversation_id.to_string(),
                user_id: user_id.to_string(),
                max_read_seq,
            }),
            None => Err(StoreError::NotFound(format!(
                "read cursor {conversation_id}/{user_id}"
            ))),
        }
    }

    async fn upsert_read_cursor(&self, cursor: ReadCursor) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.cursors.insert(
            (cursor.conversation_id, cursor.user_id),
            cursor.max_read_seq,
        );
        Ok(())
    }

    async fn delete_read_cursor(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .cursors
            .remove(&(conversation_id.to_string(), user_id.to_string()));
        Ok(())
    }

    async fn read_cursors(&self, conversation_id: &str) -> Result<Vec<ReadCursor>> {
        let tables = self.tables.read().await;
        Ok(tables
            .cursors
            .iter()
            .filter(|((conv, _), _)| conv == conversation_id)
            .map(|((conv, user), &seq)| ReadCursor {
                conversation_id: conv.clone(),
                user_id: user.clone(),
                max_read_seq: seq,
            })
            .collect())
    }

    async fn delete_all_read_cursors(&self, conversation_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.cursors.retain(|(conv, _), _| conv != conversation_id);
        Ok(())
    }

    async fn get_read_state(&self, conversation_id: &str) -> Result<ReadState> {
        let tables = self.tables.read().await;
        match tables.read_states.get(conversation_id) {
            Some(&all_read_seq) => Ok(ReadState {
                conversation_id: conversation_id.to_string(),
                all_read_seq,
            }),
            None => Err(StoreError::NotFound(format!(
                "read state {conversation_id}"
            ))),
        }
    }

    async fn upsert_read_state(&self, state: ReadState) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .read_states
            .insert(state.conversation_id, state.all_read_seq);
        Ok(())
    }

    async fn delete_read_state(&self, conversation_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.read_states.remove(conversation_id);
        Ok(())
    }

    async fn all_read_seq_excluding(
        &self,
        conversation_id: &str,
        exclude_user_id: &str,
    ) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .cursors
            .iter()
            .filter(|((conv, user), _)| conv == conversation_id && user != exclude_user_id)
            .map(|(_, &seq)| seq)
            .min()
            .unwrap_or(0))
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn get_message_by_seq(&self, conversation_id: &str, seq: i64) -> Result<Message> {
        let tables = self.tables.read().await;
        tables
            .messages
            .get(conversation_id)
            .and_then(|log| log.iter().find(|m| m.seq == seq))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("message {conversation_id}/seq {seq}")))
    }

    async fn get_messages_by_seqs(&self, conversation_id: &str, seqs: &[i64]) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        let log = match tables.messages.get(conversation_id) {
            Some(log) => log,
            None => return Ok(Vec::new()),
        };
        Ok(log
            .iter()
            .filter(|m| seqs.contains(&m.seq))
            .cloned()
            .collect())
    }

    async fn get_messages_by_client_msg_ids(
        &self,
        conversation_id: &str,
        client_msg_ids: &[String],
    ) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        let log = match tables.messages.get(conversation_id) {
            Some(log) => log,
            None => return Ok(Vec::new()),
        };
        Ok(log
            .iter()
            .filter(|m| client_msg_ids.contains(&m.client_msg_id))
            .cloned()
            .collect())
    }

    async fn get_unread_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .get(conversation_id)
            .map(|log| log.iter().filter(|m| !m.is_read).cloned().collect())
            .unwrap_or_default())
    }

    async fn update_message(&self, conversation_id: &str, message: &Message) -> Result<()> {
        let mut tables = self.tables.write().await;
        let log = tables.messages.get_mut(conversation_id).ok_or_else(|| {
            StoreError::NotFound(format!("message log {conversation_id}"))
        })?;
        let slot = log
            .iter_mut()
            .find(|m| m.client_msg_id == message.client_msg_id)
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "message {conversation_id}/{}",
                    message.client_msg_id
                ))
            })?;
        *slot = message.clone();
        Ok(())
    }

    async fn mark_messages_read_by_ids(
        &self,
        conversation_id: &str,
        client_msg_ids: &[String],
    ) -> Result<i64> {
        let mut tables = self.tables.write().await;
        let mut affected = 0;
        if let Some(log) = tables.messages.get_mut(conversation_id) {
            for message in log.iter_mut() {
                if !message.is_read && client_msg_ids.contains(&message.client_msg_id) {
                    message.is_read = true;
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    async fn mark_messages_read_by_seqs(&self, conversation_id: &str, seqs: &[i64]) -> Result<i64> {
        let mut tables = self.tables.write().await;
        let mut affected = 0;
        if let Some(log) = tables.messages.get_mut(conversation_id) {
            for message in log.iter_mut() {
                if !message.is_read && seqs.contains(&message.seq) {
                    message.is_read = true;
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    async fn max_msg_seq(&self, conversation_id: &str) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .get(conversation_id)
            .and_then(|log| log.iter().map(|m| m.seq).max())
            .unwrap_or(0))
    }

    async fn peer_max_msg_seq(&self, conversation_id: &str, self_user_id: &str) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .get(conversation_id)
            .and_then(|log| {
                log.iter()
                    .filter(|m| m.send_id != self_user_id)
                    .map(|m| m.seq)
                    .max()
            })
            .unwrap_or(0))
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        let tables = self.tables.read().await;
        tables
            .conversations
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("conversation {conversation_id}")))
    }

    async fn get_all_conversations(&self) -> Result<Vec<Conversation>> {
        let tables = self.tables.read().await;
        Ok(tables.conversations.values().cloned().collect())
    }

    async fn set_unread_count(&self, conversation_id: &str, unread_count: i32) -> Result<()> {
        let mut tables = self.tables.write().await;
        let conversation = tables.conversations.get_mut(conversation_id).ok_or_else(|| {
            StoreError::NotFound(format!("conversation {conversation_id}"))
        })?;
        conversation.unread_count = unread_count;
        Ok(())
    }

    async fn decr_unread_count(&self, conversation_id: &str, count: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        let conversation = tables.conversations.get_mut(conversation_id).ok_or_else(|| {
            StoreError::NotFound(format!("conversation {conversation_id}"))
        })?;
        conversation.unread_count = (i64::from(conversation.unread_count) - count).max(0) as i32;
        Ok(())
    }

    async fn update_latest_message(&self, conversation_id: &str, latest_msg: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let conversation = tables.conversations.get_mut(conversation_id).ok_or_else(|| {
            StoreError::NotFound(format!("conversation {conversation_id}"))
        })?;
        conversation.latest_msg = latest_msg.to_string();
        Ok(())
    }

    async fn batch_insert_conversations(&self, conversations: Vec<Conversation>) -> Result<()> {
        let mut tables = self.tables.write().await;
        for conversation in conversations {
            tables
                .conversations
                .insert(conversation.conversation_id.clone(), conversation);
        }
        Ok(())
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn group_member_ids(&self, group_id: &str) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        Ok(tables.group_members.get(group_id).cloned().unwrap_or_default())
    }
}
