/// Outbound UI listener consumed by the read-state core. Every payload is a
/// JSON string so the hosting UI (often behind an FFI or WASM boundary) can
/// hand it straight to its rendering layer.
///
/// Callbacks must be cheap and non-blocking; they are invoked from the
/// notification and reconciliation paths.
pub trait ConversationListener: Send + Sync {
    /// A peer read messages of ours in a single chat. Payload: array of
    /// `{UserID, MsgIDList, SessionType, ReadTime}`.
    fn on_recv_c2c_read_receipt(&self, receipt_list: String);

    /// A group member's read position moved. Payload: array of
    /// `{GroupID, UserID, MsgIDList, HasReadSeq, SessionType, ReadTime}`.
    fn on_recv_group_read_receipt(&self, receipt_list: String);

    /// The conversation's all-read aggregate moved. Payload:
    /// `{conversationID, allReadSeq}`. Only fired for subscribed
    /// conversations, except for the post-reconnect repaint.
    fn on_conversation_read_state_changed(&self, payload: String);
}
