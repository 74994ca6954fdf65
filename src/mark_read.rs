use crate::controller::ReadStateController;
use crate::error::Result;
use crate::store::traits::{ConversationStore, MessageStore};
use crate::types::conversation::ConversationType;
use crate::types::message::Message;
use log::{debug, error, warn};

impl ReadStateController {
    /// Marks every message in the conversation as read.
    ///
    /// The server is informed before any local row is touched, so a
    /// transport failure leaves local state untouched and the next attempt
    /// reconverges. Serialised per controller so concurrent calls cannot
    /// split the unread counter.
    pub async fn mark_conversation_as_read(&self, conversation_id: &str) -> Result<()> {
        let _guard = self.conversation_sync_mutex.lock().await;

        let conversation = self.db.get_conversation(conversation_id).await?;
        if conversation.unread_count == 0 {
            debug!(target: "ReadState", "nothing unread in {conversation_id}, skipping");
            return Ok(());
        }

        let peer_max_seq = self
            .db
            .peer_max_msg_seq(conversation_id, &self.login_user_id)
            .await?;
        let max_seq = self.db.max_msg_seq(conversation_id).await?;

        match conversation.conversation_type {
            ConversationType::SingleChat => {
                let messages = self.db.get_unread_messages(conversation_id).await?;
                let (client_msg_ids, seqs) = self.collect_markable(&messages);
                if seqs.is_empty() {
                    warn!(target: "ReadState", "no markable messages in {conversation_id}, reporting position only");
                }
                self.api
                    .mark_conversation_as_read(conversation_id, max_seq, &seqs)
                    .await?;
                if !seqs.is_empty() {
                    if let Err(e) = self
                        .db
                        .mark_messages_read_by_ids(conversation_id, &client_msg_ids)
                        .await
                    {
                        warn!(target: "ReadState", "failed to flag messages read in {conversation_id}: {e}");
                    }
                }
            }
            ConversationType::ReadGroupChat | ConversationType::Notification => {
                // Group and notification messages carry no per-recipient
                // read flag; reporting the position is all there is to do.
                self.api
                    .mark_conversation_as_read(conversation_id, max_seq, &[])
                    .await?;
            }
        }

        if let Err(e) = self.db.set_unread_count(conversation_id, 0).await {
            error!(target: "ReadState", "failed to zero unread count for {conversation_id}: {e}");
        }
        self.unread_change_trigger(conversation_id, peer_max_seq == max_seq);
        Ok(())
    }

    /// Marks specific messages as read by client message id.
    pub async fn mark_messages_as_read_by_id(
        &self,
        conversation_id: &str,
        client_msg_ids: &[String],
    ) -> Result<()> {
        self.db.get_conversation(conversation_id).await?;
        let messages = self
            .db
            .get_messages_by_client_msg_ids(conversation_id, client_msg_ids)
            .await?;
        if messages.is_empty() {
            return Ok(());
        }
        let has_read_seq = messages[0].seq;
        let max_seq = self.db.max_msg_seq(conversation_id).await?;

        let (markable_ids, seqs) = self.collect_markable(&messages);
        if seqs.is_empty() {
            debug!(target: "ReadState", "none of the requested messages in {conversation_id} can be marked");
            return Ok(());
        }

        self.api.mark_messages_as_read(conversation_id, &seqs).await?;

        let affected = self
            .db
            .mark_messages_read_by_ids(conversation_id, &markable_ids)
            .await?;
        if let Err(e) = self.db.decr_unread_count(conversation_id, affected).await {
            error!(target: "ReadState", "failed to decrement unread count for {conversation_id}: {e}");
        }

        self.unread_change_trigger(
            conversation_id,
            has_read_seq == max_seq && messages[0].send_id != self.login_user_id,
        );
        Ok(())
    }

    /// Reports the local max seq to the server as the own-read position.
    /// Used when entering a conversation whose per-message state is already
    /// settled. A conversation with no sequenced messages has nothing to
    /// report.
    pub async fn mark_conversation_read_to_max_seq(&self, conversation_id: &str) -> Result<()> {
        let max_seq = self.db.max_msg_seq(conversation_id).await?;
        if max_seq == 0 {
            return Ok(());
        }
        self.api
            .mark_conversation_as_read(conversation_id, max_seq, &[])
            .await
    }

    /// Splits out the messages that can legitimately be flagged read:
    /// unread, not sent by the logged-in user, and carrying a server seq.
    fn collect_markable(&self, messages: &[Message]) -> (Vec<String>, Vec<i64>) {
        let mut client_msg_ids = Vec::new();
        let mut seqs = Vec::new();
        for message in messages {
            if message.is_read || message.send_id == self.login_user_id {
                continue;
            }
            if message.seq == 0 {
                warn!(target: "ReadState", "message {} has no server seq, skipping", message.client_msg_id);
                continue;
            }
            client_msg_ids.push(message.client_msg_id.clone());
            seqs.push(message.seq);
        }
        (client_msg_ids, seqs)
    }

    pub(crate) fn unread_change_trigger(&self, conversation_id: &str, latest_msg_is_read: bool) {
        if latest_msg_is_read {
            self.emit_latest_message_read(conversation_id);
        }
        self.emit_conversation_changed(vec![conversation_id.to_string()]);
        self.emit_total_unread_changed();
    }
}
