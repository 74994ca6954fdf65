use serde::{Deserialize, Serialize};

/// Local chat-log row, owned by the external message store. The read-state
/// core flips the read flag and stamps the read time into the attached-info
/// blob; everything else belongs to the message pipeline.
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub client_msg_id: String,
    pub send_id: String,
    /// Server-assigned sequence, monotone per conversation. 0 means the
    /// message has not been sequenced by the server.
    pub seq: i64,
    pub is_read: bool,
    pub send_time: i64,
    /// JSON-encoded [`AttachedInfo`].
    pub attached_info: String,
}

/// Auxiliary per-message data kept as a JSON blob on the message row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachedInfo {
    #[serde(rename = "hasReadTime")]
    pub has_read_time: i64,
}
