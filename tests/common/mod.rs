// Shared fixtures for the integration tests: an in-memory backend, a server
// stub with canned responses and a call log, and a listener that records
// every callback payload.
#![allow(dead_code)]

use async_trait::async_trait;
use readstate::error::Result;
use readstate::listener::ConversationListener;
use readstate::store::memory::MemoryStore;
use readstate::store::traits::Backend;
use readstate::transport::{
    ConversationReadCursors, HasReadAndMaxSeq, ServerApi, ServerReadCursor,
};
use readstate::types::conversation::{Conversation, ConversationType, LatestMessage};
use readstate::types::message::Message;
use readstate::types::tips::NotificationEnvelope;
use readstate::ReadStateController;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct RecordingListener {
    pub c2c_receipts: Mutex<Vec<String>>,
    pub group_receipts: Mutex<Vec<String>>,
    pub read_state_changes: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn c2c_receipts(&self) -> Vec<String> {
        self.c2c_receipts.lock().unwrap().clone()
    }

    pub fn group_receipts(&self) -> Vec<String> {
        self.group_receipts.lock().unwrap().clone()
    }

    pub fn read_state_changes(&self) -> Vec<String> {
        self.read_state_changes.lock().unwrap().clone()
    }
}

impl ConversationListener for RecordingListener {
    fn on_recv_c2c_read_receipt(&self, receipt_list: String) {
        self.c2c_receipts.lock().unwrap().push(receipt_list);
    }

    fn on_recv_group_read_receipt(&self, receipt_list: String) {
        self.group_receipts.lock().unwrap().push(receipt_list);
    }

    fn on_conversation_read_state_changed(&self, payload: String) {
        self.read_state_changes.lock().unwrap().push(payload);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCall {
    GetHasReadAndMaxSeq,
    GetReadCursors {
        conversation_ids: Vec<String>,
    },
    MarkConversationAsRead {
        conversation_id: String,
        has_read_seq: i64,
        seqs: Vec<i64>,
    },
    MarkMessagesAsRead {
        conversation_id: String,
        seqs: Vec<i64>,
    },
    GetConversations {
        conversation_ids: Vec<String>,
    },
}

/// Server stub: responses are whatever the test seeded, every request is
/// appended to `calls`.
#[derive(Default)]
pub struct FakeServer {
    pub seq_pairs: Mutex<HashMap<String, HasReadAndMaxSeq>>,
    pub cursors: Mutex<Vec<ConversationReadCursors>>,
    pub conversations: Mutex<Vec<Conversation>>,
    pub calls: Mutex<Vec<ServerCall>>,
}

impl FakeServer {
    pub fn calls(&self) -> Vec<ServerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn seed_seq_pair(&self, conversation_id: &str, max_seq: i64, has_read_seq: i64) {
        self.seq_pairs.lock().unwrap().insert(
            conversation_id.to_string(),
            HasReadAndMaxSeq {
                max_seq,
                has_read_seq,
            },
        );
    }

    pub fn seed_cursors(&self, conversation_id: &str, cursors: &[(&str, i64)]) {
        self.cursors.lock().unwrap().push(ConversationReadCursors {
            conversation_id: conversation_id.to_string(),
            cursors: cursors
                .iter()
                .map(|(user_id, max_read_seq)| ServerReadCursor {
                    user_id: user_id.to_string(),
                    max_read_seq: *max_read_seq,
                })
                .collect(),
        });
    }
}

#[async_trait]
impl ServerApi for FakeServer {
    async fn get_conversations_has_read_and_max_seq(
        &self,
    ) -> Result<HashMap<String, HasReadAndMaxSeq>> {
        self.calls
            .lock()
            .unwrap()
            .push(ServerCall::GetHasReadAndMaxSeq);
        Ok(self.seq_pairs.lock().unwrap().clone())
    }

    async fn get_conversation_read_cursors(
        &self,
        conversation_ids: &[String],
    ) -> Result<Vec<ConversationReadCursors>> {
        self.calls.lock().unwrap().push(ServerCall::GetReadCursors {
            conversation_ids: conversation_ids.to_vec(),
        });
        Ok(self
            .cursors
            .lock()
            .unwrap()
            .iter()
            .filter(|c| conversation_ids.contains(&c.conversation_id))
            .cloned()
            .collect())
    }

    async fn mark_conversation_as_read(
        &self,
        conversation_id: &str,
        has_read_seq: i64,
        seqs: &[i64],
    ) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(ServerCall::MarkConversationAsRead {
                conversation_id: conversation_id.to_string(),
                has_read_seq,
                seqs: seqs.to_vec(),
            });
        Ok(())
    }

    async fn mark_messages_as_read(&self, conversation_id: &str, seqs: &[i64]) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(ServerCall::MarkMessagesAsRead {
                conversation_id: conversation_id.to_string(),
                seqs: seqs.to_vec(),
            });
        Ok(())
    }

    async fn get_conversations_by_ids(
        &self,
        conversation_ids: &[String],
    ) -> Result<Vec<Conversation>> {
        self.calls.lock().unwrap().push(ServerCall::GetConversations {
            conversation_ids: conversation_ids.to_vec(),
        });
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .filter(|c| conversation_ids.contains(&c.conversation_id))
            .cloned()
            .collect())
    }
}

pub struct Harness {
    pub controller: Arc<ReadStateController>,
    pub db: Arc<MemoryStore>,
    pub server: Arc<FakeServer>,
    pub listener: Arc<RecordingListener>,
}

pub fn harness(login_user_id: &str) -> Harness {
    let db = Arc::new(MemoryStore::new());
    let server = Arc::new(FakeServer::default());
    let listener = Arc::new(RecordingListener::default());
    let controller = Arc::new(ReadStateController::new(
        login_user_id,
        db.clone() as Arc<dyn Backend>,
        server.clone() as Arc<dyn ServerApi>,
        listener.clone() as Arc<dyn ConversationListener>,
    ));
    Harness {
        controller,
        db,
        server,
        listener,
    }
}

pub fn latest_message(client_msg_id: &str, seq: i64, is_read: bool) -> LatestMessage {
    LatestMessage {
        client_msg_id: client_msg_id.to_string(),
        seq,
        is_read,
        send_time: 0,
    }
}

pub fn single_conversation(
    conversation_id: &str,
    peer_id: &str,
    unread_count: i32,
    latest: &LatestMessage,
) -> Conversation {
    Conversation {
        conversation_id: conversation_id.to_string(),
        conversation_type: ConversationType::SingleChat,
        user_id: peer_id.to_string(),
        group_id: String::new(),
        unread_count,
        latest_msg: serde_json::to_string(latest).unwrap(),
        latest_msg_send_time: latest.send_time,
    }
}

pub fn group_conversation(
    conversation_id: &str,
    group_id: &str,
    unread_count: i32,
    latest_msg_send_time: i64,
) -> Conversation {
    Conversation {
        conversation_id: conversation_id.to_string(),
        conversation_type: ConversationType::ReadGroupChat,
        user_id: String::new(),
        group_id: group_id.to_string(),
        unread_count,
        latest_msg: serde_json::to_string(&LatestMessage::default()).unwrap(),
        latest_msg_send_time,
    }
}

pub fn message(client_msg_id: &str, send_id: &str, seq: i64, is_read: bool) -> Message {
    Message {
        client_msg_id: client_msg_id.to_string(),
        send_id: send_id.to_string(),
        seq,
        is_read,
        send_time: 0,
        attached_info: String::from("{}"),
    }
}

pub fn tip_envelope<T: Serialize>(content_type: i32, send_time: i64, tips: &T) -> NotificationEnvelope {
    NotificationEnvelope {
        content_type,
        send_time,
        content: serde_json::to_string(tips).unwrap(),
    }
}
