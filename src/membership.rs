use crate::controller::ReadStateController;
use crate::error::Result;
use crate::store::traits::ReadStore;
use crate::types::conversation::group_chat_id;
use crate::types::tips::{
    GroupDismissedTips, MemberEnterTips, MemberInvitedTips, MemberKickedTips, MemberQuitTips,
    NotificationEnvelope, CONTENT_TYPE_GROUP_DISMISSED, CONTENT_TYPE_MEMBER_ENTER,
    CONTENT_TYPE_MEMBER_INVITED, CONTENT_TYPE_MEMBER_KICKED, CONTENT_TYPE_MEMBER_QUIT,
};
use log::warn;
use std::sync::Arc;

impl ReadStateController {
    /// Reacts to a group-membership notification on its own task, so the
    /// notification dispatcher never blocks behind a server sync. Ordering
    /// against concurrent read ingestion for the same conversation is not
    /// guaranteed; monotone cursors and the full-rescan aggregate make the
    /// reactions idempotent and order-insensitive.
    pub(crate) fn handle_membership_notification(
        self: &Arc<Self>,
        envelope: &NotificationEnvelope,
    ) {
        let controller = Arc::clone(self);
        let envelope = envelope.clone();
        tokio::spawn(async move {
            if let Err(e) = controller.apply_membership_notification(&envelope).await {
                warn!(
                    target: "ReadState/Membership",
                    "membership reaction failed for content type {}: {e}",
                    envelope.content_type
                );
            }
        });
    }

    async fn apply_membership_notification(&self, envelope: &NotificationEnvelope) -> Result<()> {
        match envelope.content_type {
            CONTENT_TYPE_MEMBER_QUIT => {
                let tips: MemberQuitTips = envelope.decode()?;
                if tips.quit_user.user_id == self.login_user_id {
                    return Ok(());
                }
                let conversation_id = group_chat_id(&tips.group.group_id);
                self.remove_member_cursors(&conversation_id, &[tips.quit_user.user_id])
                    .await;
                Ok(())
            }
            CONTENT_TYPE_MEMBER_KICKED => {
                let tips: MemberKickedTips = envelope.decode()?;
                let user_ids: Vec<String> = tips
                    .kicked_user_list
                    .into_iter()
                    .map(|member| member.user_id)
                    .filter(|user_id| user_id != &self.login_user_id)
                    .collect();
                if user_ids.is_empty() {
                    return Ok(());
                }
                let conversation_id = group_chat_id(&tips.group.group_id);
                self.remove_member_cursors(&conversation_id, &user_ids).await;
                Ok(())
            }
            CONTENT_TYPE_MEMBER_INVITED => {
                let tips: MemberInvitedTips = envelope.decode()?;
                let any_other = tips
                    .invited_user_list
                    .iter()
                    .any(|member| member.user_id != self.login_user_id);
                if !any_other {
                    return Ok(());
                }
                self.sync_cursors_for_new_members(&group_chat_id(&tips.group.group_id))
                    .await;
                Ok(())
            }
            CONTENT_TYPE_MEMBER_ENTER => {
                let tips: MemberEnterTips = envelope.decode()?;
                if tips.entrant_user.user_id == self.login_user_id {
                    return Ok(());
                }
                self.sync_cursors_for_new_members(&group_chat_id(&tips.group.group_id))
                    .await;
                Ok(())
            }
            CONTENT_TYPE_GROUP_DISMISSED => {
                let tips: GroupDismissedTips = envelope.decode()?;
                let conversation_id = group_chat_id(&tips.group.group_id);
                if let Err(e) = self.db.delete_all_read_cursors(&conversation_id).await {
                    warn!(target: "ReadState/Membership", "failed to drop cursors of {conversation_id}: {e}");
                }
                if let Err(e) = self.db.delete_read_state(&conversation_id).await {
                    warn!(target: "ReadState/Membership", "failed to drop read state of {conversation_id}: {e}");
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Drops departed members' cursors and refreshes the aggregate, which
    /// can only rise when a cursor disappears.
    async fn remove_member_cursors(&self, conversation_id: &str, user_ids: &[String]) {
        for user_id in user_ids {
            if let Err(e) = self.db.delete_read_cursor(conversation_id, user_id).await {
                warn!(
                    target: "ReadState/Membership",
                    "failed to delete cursor {conversation_id}/{user_id}: {e}"
                );
            }
        }
        self.refresh_read_state(conversation_id).await;
    }

    /// Pulls the server's cursors after a membership addition. A joiner may
    /// be re-entering with a server-side read position; fabricating a
    /// zero-seq cursor locally would depress the aggregate and flap the
    /// change callback.
    async fn sync_cursors_for_new_members(&self, conversation_id: &str) {
        if let Err(e) = self.sync_read_cursors(&[conversation_id.to_string()]).await {
            warn!(
                target: "ReadState/Membership",
                "cursor sync after member change failed for {conversation_id}: {e}"
            );
        }
    }

    /// Invoked by the conversation catalogue when a conversation is
    /// removed. Cursors and the derived row go with it; subscription state
    /// is pruned so the set does not accumulate dead ids.
    pub async fn handle_conversation_deleted(&self, conversation_id: &str) {
        if let Err(e) = self.db.delete_all_read_cursors(conversation_id).await {
            warn!(target: "ReadState", "failed to drop cursors of {conversation_id}: {e}");
        }
        if let Err(e) = self.db.delete_read_state(conversation_id).await {
            warn!(target: "ReadState", "failed to drop read state of {conversation_id}: {e}");
        }
        self.subscriptions.unsubscribe(conversation_id);
    }
}
