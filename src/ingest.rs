use crate::controller::ReadStateController;
use crate::error::{CoreError, Result};
use crate::recompute::{apply_cursor_update, CursorUpdate};
use crate::store::traits::{ConversationStore, MessageStore};
use crate::types::conversation::{Conversation, ConversationType, LatestMessage};
use crate::types::message::AttachedInfo;
use crate::types::receipts::{GroupMessageReceipt, MessageReceipt};
use crate::types::tips::{GroupHasReadTips, MarkAsReadTips, NotificationEnvelope};
use crate::types::to_json_string;
use log::{debug, warn};

impl ReadStateController {
    /// Handles a mark-as-read notification (content type 2200).
    ///
    /// When the marker is another user this is a peer read of our messages,
    /// which only occurs in single chats; peer reads in groups arrive as
    /// group-has-read broadcasts (2201) instead. When the marker is the
    /// logged-in user it is a sync of a read action performed on one of the
    /// user's other devices.
    pub(crate) async fn handle_mark_as_read_tips(
        &self,
        envelope: &NotificationEnvelope,
    ) -> Result<()> {
        let tips: MarkAsReadTips = envelope.decode()?;
        debug!(
            target: "ReadState",
            "mark-as-read in {}: user {}, has_read_seq {}, {} seqs",
            tips.conversation_id, tips.mark_as_read_user_id, tips.has_read_seq, tips.seqs.len()
        );

        let conversation = self.db.get_conversation(&tips.conversation_id).await?;

        if tips.mark_as_read_user_id == self.login_user_id {
            return self
                .apply_self_read(&conversation, tips.has_read_seq, &tips.seqs)
                .await;
        }

        match conversation.conversation_type {
            ConversationType::SingleChat => {
                self.apply_peer_read(conversation, &tips, envelope.send_time)
                    .await
            }
            ConversationType::ReadGroupChat => {
                warn!(
                    target: "ReadState",
                    "unexpected mark-as-read from {} in group conversation {}, dropping",
                    tips.mark_as_read_user_id, tips.conversation_id
                );
                Ok(())
            }
            ConversationType::Notification => Ok(()),
        }
    }

    /// A single-chat peer read some of our messages: stamp them read, keep
    /// the latest-message snapshot in step, surface a C2C receipt, and move
    /// the peer's cursor.
    async fn apply_peer_read(
        &self,
        mut conversation: Conversation,
        tips: &MarkAsReadTips,
        read_time: i64,
    ) -> Result<()> {
        if tips.seqs.is_empty() {
            return Err(CoreError::TipsSeqsEmpty);
        }

        let messages = self
            .db
            .get_messages_by_seqs(&tips.conversation_id, &tips.seqs)
            .await?;
        let mut latest: LatestMessage = serde_json::from_str(&conversation.latest_msg)?;

        let mut updated_ids = Vec::new();
        let mut max_updated_seq = 0i64;
        for mut message in messages {
            let mut attached: AttachedInfo =
                serde_json::from_str(&message.attached_info).unwrap_or_default();
            attached.has_read_time = read_time;
            message.attached_info = to_json_string(&attached);
            message.is_read = true;
            self.db
                .update_message(&tips.conversation_id, &message)
                .await?;

            if latest.client_msg_id == message.client_msg_id {
                latest.is_read = true;
                conversation.latest_msg = to_json_string(&latest);
                self.db
                    .update_latest_message(&tips.conversation_id, &conversation.latest_msg)
                    .await?;
                self.emit_conversation_changed(vec![tips.conversation_id.clone()]);
            }

            max_updated_seq = max_updated_seq.max(message.seq);
            updated_ids.push(message.client_msg_id);
        }

        let receipts = vec![MessageReceipt {
            user_id: tips.mark_as_read_user_id.clone(),
            msg_id_list: updated_ids,
            session_type: conversation.conversation_type.as_i32(),
            read_time,
        }];
        self.listener
            .on_recv_c2c_read_receipt(to_json_string(&receipts));

        if max_updated_seq > 0 {
            let update = apply_cursor_update(
                self.db.as_ref(),
                &self.login_user_id,
                &tips.conversation_id,
                &tips.mark_as_read_user_id,
                max_updated_seq,
            )
            .await?;
            if update.changed {
                self.notify_read_state_if_subscribed(&tips.conversation_id)
                    .await;
            }
        }
        Ok(())
    }

    /// Applies a read position reported by one of the user's own devices.
    ///
    /// Groups clear their unread wholesale; only single chats carry
    /// per-message flags that need replaying. The duplicate guards here are
    /// load-bearing: the same read action can arrive both through the local
    /// path and through this sync.
    pub(crate) async fn apply_self_read(
        &self,
        conversation: &Conversation,
        has_read_seq: i64,
        seqs: &[i64],
    ) -> Result<()> {
        if conversation.conversation_type == ConversationType::SingleChat {
            if seqs.is_empty() {
                return Err(CoreError::SeqListEmpty(conversation.conversation_id.clone()));
            }
            let marker = self
                .db
                .get_message_by_seq(&conversation.conversation_id, has_read_seq)
                .await?;
            if marker.is_read {
                return Err(CoreError::SelfReadIgnored);
            }
            self.db
                .mark_messages_read_by_seqs(&conversation.conversation_id, seqs)
                .await?;

            let current_max_seq = self.max_seq_recorder.get(&conversation.conversation_id);
            if current_max_seq == 0 {
                return Err(CoreError::CurrentMaxSeqZero(
                    conversation.conversation_id.clone(),
                ));
            }
            let mut unread = current_max_seq - has_read_seq;
            if unread < 0 {
                warn!(
                    target: "ReadState",
                    "read position {} ahead of recorded max {} in {}",
                    has_read_seq, current_max_seq, conversation.conversation_id
                );
                unread = 0;
            }
            self.db
                .set_unread_count(&conversation.conversation_id, unread as i32)
                .await?;

            let latest: LatestMessage = serde_json::from_str(&conversation.latest_msg)?;
            if !latest.is_read && seqs.contains(&latest.seq) {
                self.emit_latest_message_read(&conversation.conversation_id);
            }
        } else {
            self.db
                .set_unread_count(&conversation.conversation_id, 0)
                .await?;
        }

        self.emit_conversation_changed(vec![conversation.conversation_id.clone()]);
        self.emit_total_unread_changed();
        Ok(())
    }

    /// Handles a group member's read-position broadcast (content type 2201).
    pub(crate) async fn handle_group_has_read_tips(
        &self,
        envelope: &NotificationEnvelope,
    ) -> Result<()> {
        let tips: GroupHasReadTips = envelope.decode()?;

        // Our own position comes back on 2200 for device sync; the
        // broadcast copy is redundant.
        if tips.user_id == self.login_user_id {
            return Ok(());
        }

        let conversation = self.db.get_conversation(&tips.conversation_id).await?;

        let mut update = CursorUpdate::NOOP;
        if tips.has_read_seq > 0 {
            update = apply_cursor_update(
                self.db.as_ref(),
                &self.login_user_id,
                &tips.conversation_id,
                &tips.user_id,
                tips.has_read_seq,
            )
            .await?;
        }

        // The raw receipt goes out even when the cursor did not move, so
        // per-member read indicators stay live under replays.
        let receipts = vec![GroupMessageReceipt {
            group_id: tips.group_id.clone(),
            user_id: tips.user_id.clone(),
            msg_id_list: None,
            has_read_seq: tips.has_read_seq,
            session_type: conversation.conversation_type.as_i32(),
            read_time: envelope.send_time,
        }];
        self.listener
            .on_recv_group_read_receipt(to_json_string(&receipts));

        if update.changed {
            self.notify_read_state_if_subscribed(&tips.conversation_id)
                .await;
        }
        Ok(())
    }
}
