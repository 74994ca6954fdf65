use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// Notification content types consumed by the read-state core. The decimal
// values are fixed by the server protocol.
pub const CONTENT_TYPE_MARK_AS_READ: i32 = 2200;
pub const CONTENT_TYPE_GROUP_HAS_READ: i32 = 2201;
pub const CONTENT_TYPE_MEMBER_QUIT: i32 = 1504;
pub const CONTENT_TYPE_MEMBER_KICKED: i32 = 1508;
pub const CONTENT_TYPE_MEMBER_INVITED: i32 = 1509;
pub const CONTENT_TYPE_MEMBER_ENTER: i32 = 1510;
pub const CONTENT_TYPE_GROUP_DISMISSED: i32 = 1511;

/// A server-pushed notification, already demultiplexed by the notification
/// dispatcher. `content` is the JSON tip payload for `content_type`.
#[derive(Debug, Clone)]
pub struct NotificationEnvelope {
    pub content_type: i32,
    /// Server send time of the enclosing message, in milliseconds. Doubles
    /// as the read time stamped onto messages by read notifications.
    pub send_time: i64,
    pub content: String,
}

impl NotificationEnvelope {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.content)
    }
}

/// Tip for content type 2200: a user (a peer, or this user on another
/// device) marked messages read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkAsReadTips {
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
    #[serde(rename = "markAsReadUserID")]
    pub mark_as_read_user_id: String,
    #[serde(rename = "hasReadSeq")]
    pub has_read_seq: i64,
    #[serde(rename = "seqs")]
    pub seqs: Vec<i64>,
}

/// Tip for content type 2201: a group member's read position, broadcast to
/// the other members.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupHasReadTips {
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "hasReadSeq")]
    pub has_read_seq: i64,
    #[serde(rename = "groupID")]
    pub group_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupInfo {
    #[serde(rename = "groupID")]
    pub group_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMemberInfo {
    #[serde(rename = "userID")]
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberQuitTips {
    #[serde(rename = "group")]
    pub group: GroupInfo,
    #[serde(rename = "quitUser")]
    pub quit_user: GroupMemberInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberKickedTips {
    #[serde(rename = "group")]
    pub group: GroupInfo,
    #[serde(rename = "kickedUserList")]
    pub kicked_user_list: Vec<GroupMemberInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberInvitedTips {
    #[serde(rename = "group")]
    pub group: GroupInfo,
    #[serde(rename = "invitedUserList")]
    pub invited_user_list: Vec<GroupMemberInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberEnterTips {
    #[serde(rename = "group")]
    pub group: GroupInfo,
    #[serde(rename = "entrantUser")]
    pub entrant_user: GroupMemberInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupDismissedTips {
    #[serde(rename = "group")]
    pub group: GroupInfo,
}
