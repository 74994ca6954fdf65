use serde::{Deserialize, Serialize};

/// Session type tag carried by every conversation row. The numeric values
/// are part of the server contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationType {
    SingleChat,
    ReadGroupChat,
    Notification,
}

impl ConversationType {
    pub const fn as_i32(self) -> i32 {
        match self {
            ConversationType::SingleChat => 1,
            ConversationType::ReadGroupChat => 3,
            ConversationType::Notification => 4,
        }
    }

    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(ConversationType::SingleChat),
            3 => Some(ConversationType::ReadGroupChat),
            4 => Some(ConversationType::Notification),
            _ => None,
        }
    }
}

/// Local row of the conversation catalogue. The catalogue owns the row; the
/// read-state core reads it and mutates the unread counter and the
/// latest-message snapshot through the storage contract.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub conversation_id: String,
    pub conversation_type: ConversationType,
    /// Peer user id for single chats, empty otherwise.
    pub user_id: String,
    /// Group id for group conversations, empty otherwise.
    pub group_id: String,
    pub unread_count: i32,
    /// JSON-encoded [`LatestMessage`] snapshot.
    pub latest_msg: String,
    pub latest_msg_send_time: i64,
}

/// The snapshot serialized into [`Conversation::latest_msg`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LatestMessage {
    #[serde(rename = "clientMsgID")]
    pub client_msg_id: String,
    #[serde(rename = "seq")]
    pub seq: i64,
    #[serde(rename = "isRead")]
    pub is_read: bool,
    #[serde(rename = "sendTime")]
    pub send_time: i64,
}

/// Conversation id for a single chat between two users. The two ids are
/// sorted so both sides derive the same conversation id.
pub fn single_chat_id(user_a: &str, user_b: &str) -> String {
    let (lo, hi) = if user_a <= user_b {
        (user_a, user_b)
    } else {
        (user_b, user_a)
    };
    format!("si_{lo}_{hi}")
}

/// Conversation id for a group chat.
pub fn group_chat_id(group_id: &str) -> String {
    format!("sg_{group_id}")
}
