use serde::{Deserialize, Serialize};

/// Entry of the `on_recv_c2c_read_receipt` payload: one reader and the
/// messages of theirs that reader has now seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReceipt {
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "MsgIDList")]
    pub msg_id_list: Vec<String>,
    #[serde(rename = "SessionType")]
    pub session_type: i32,
    #[serde(rename = "ReadTime")]
    pub read_time: i64,
}

/// Entry of the `on_recv_group_read_receipt` payload. Group reads carry a
/// read position rather than individual message ids, so `msg_id_list` is
/// always null on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMessageReceipt {
    #[serde(rename = "GroupID")]
    pub group_id: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "MsgIDList")]
    pub msg_id_list: Option<Vec<String>>,
    #[serde(rename = "HasReadSeq")]
    pub has_read_seq: i64,
    #[serde(rename = "SessionType")]
    pub session_type: i32,
    #[serde(rename = "ReadTime")]
    pub read_time: i64,
}

/// Payload of `on_conversation_read_state_changed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadStateChanged {
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
    #[serde(rename = "allReadSeq")]
    pub all_read_seq: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c2c_receipt_serializes_with_wire_field_names() {
        let receipt = MessageReceipt {
            user_id: "B".into(),
            msg_id_list: vec!["m7".into()],
            session_type: 1,
            read_time: 1000,
        };
        let json = serde_json::to_string(&vec![receipt]).unwrap();
        assert_eq!(
            json,
            r#"[{"UserID":"B","MsgIDList":["m7"],"SessionType":1,"ReadTime":1000}]"#
        );
    }

    #[test]
    fn group_receipt_serializes_null_msg_id_list() {
        let receipt = GroupMessageReceipt {
            group_id: "G".into(),
            user_id: "U2".into(),
            msg_id_list: None,
            has_read_seq: 8,
            session_type: 3,
            read_time: 2000,
        };
        let json = serde_json::to_string(&receipt).unwrap();
        assert!(json.contains("\"MsgIDList\":null"));
        assert!(json.contains("\"HasReadSeq\":8"));
    }

    #[test]
    fn read_state_changed_uses_camel_case_keys() {
        let payload = ReadStateChanged {
            conversation_id: "sg_G".into(),
            all_read_seq: 5,
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"conversationID":"sg_G","allReadSeq":5}"#
        );
    }
}
