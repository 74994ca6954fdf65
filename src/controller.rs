use crate::error::Result;
use crate::events::{CommandBus, ConversationChanged, LatestMessageRead, TotalUnreadChanged};
use crate::listener::ConversationListener;
use crate::recorder::MaxSeqRecorder;
use crate::store::error::StoreError;
use crate::store::traits::{Backend, ReadStore};
use crate::subscription::SubscriptionSet;
use crate::transport::ServerApi;
use crate::types::receipts::ReadStateChanged;
use crate::types::tips::{
    NotificationEnvelope, CONTENT_TYPE_GROUP_DISMISSED, CONTENT_TYPE_GROUP_HAS_READ,
    CONTENT_TYPE_MARK_AS_READ, CONTENT_TYPE_MEMBER_ENTER, CONTENT_TYPE_MEMBER_INVITED,
    CONTENT_TYPE_MEMBER_KICKED, CONTENT_TYPE_MEMBER_QUIT,
};
use crate::types::to_json_string;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Coordinates every read-position mutation for the logged-in user: local
/// mark-as-read actions, server-pushed read notifications, membership
/// changes, and periodic reconciliation against the server.
///
/// One instance lives per logged-in SDK session. Storage, transport and the
/// UI listener are injected behind their contracts; the controller itself
/// holds only in-memory coordination state (the max-seq recorder, the
/// subscription set and the per-conversation action lock), which does not
/// survive restarts.
pub struct ReadStateController {
    pub(crate) login_user_id: String,
    pub(crate) db: Arc<dyn Backend>,
    pub(crate) api: Arc<dyn ServerApi>,
    pub(crate) listener: Arc<dyn ConversationListener>,
    pub(crate) bus: CommandBus,
    pub(crate) max_seq_recorder: MaxSeqRecorder,
    pub(crate) subscriptions: SubscriptionSet,
    /// Serialises whole-conversation read actions so concurrent calls
    /// cannot split the unread counter.
    pub(crate) conversation_sync_mutex: Mutex<()>,
}

impl ReadStateController {
    pub fn new(
        login_user_id: impl Into<String>,
        db: Arc<dyn Backend>,
        api: Arc<dyn ServerApi>,
        listener: Arc<dyn ConversationListener>,
    ) -> Self {
        Self {
            login_user_id: login_user_id.into(),
            db,
            api,
            listener,
            bus: CommandBus::new(),
            max_seq_recorder: MaxSeqRecorder::new(),
            subscriptions: SubscriptionSet::new(),
            conversation_sync_mutex: Mutex::new(()),
        }
    }

    pub fn login_user_id(&self) -> &str {
        &self.login_user_id
    }

    /// The command bus carrying conversation-change, latest-message-read
    /// and total-unread updates to the hosting UI.
    pub fn commands(&self) -> &CommandBus {
        &self.bus
    }

    /// The per-conversation max-seq recorder. The hosting message pipeline
    /// feeds it as new sequenced messages arrive; reconciliation overwrites
    /// it with the server's value.
    pub fn max_seq_recorder(&self) -> &MaxSeqRecorder {
        &self.max_seq_recorder
    }

    /// Declares that the UI renders the conversation and wants aggregate
    /// callbacks for it.
    pub fn subscribe_conversation(&self, conversation_id: &str) {
        self.subscriptions.subscribe(conversation_id);
    }

    pub fn unsubscribe_conversation(&self, conversation_id: &str) {
        self.subscriptions.unsubscribe(conversation_id);
    }

    pub fn is_conversation_subscribed(&self, conversation_id: &str) -> bool {
        self.subscriptions.is_subscribed(conversation_id)
    }

    /// Entry point for the notification dispatcher. Read tips are handled
    /// inline; membership changes are spawned onto their own task so the
    /// dispatcher never blocks on them.
    pub async fn handle_notification(
        self: &Arc<Self>,
        envelope: &NotificationEnvelope,
    ) -> Result<()> {
        match envelope.content_type {
            CONTENT_TYPE_MARK_AS_READ => self.handle_mark_as_read_tips(envelope).await,
            CONTENT_TYPE_GROUP_HAS_READ => self.handle_group_has_read_tips(envelope).await,
            CONTENT_TYPE_MEMBER_QUIT
            | CONTENT_TYPE_MEMBER_KICKED
            | CONTENT_TYPE_MEMBER_INVITED
            | CONTENT_TYPE_MEMBER_ENTER
            | CONTENT_TYPE_GROUP_DISMISSED => {
                self.handle_membership_notification(envelope);
                Ok(())
            }
            other => {
                debug!(target: "ReadState", "ignoring notification with content type {other}");
                Ok(())
            }
        }
    }

    /// Reports the conversation's current aggregate to the UI listener.
    pub(crate) async fn notify_read_state(&self, conversation_id: &str) {
        let all_read_seq = match self.db.get_read_state(conversation_id).await {
            Ok(state) => state.all_read_seq,
            Err(StoreError::NotFound(_)) => 0,
            Err(e) => {
                warn!(target: "ReadState", "failed to load read state for {conversation_id}: {e}");
                return;
            }
        };
        let payload = ReadStateChanged {
            conversation_id: conversation_id.to_string(),
            all_read_seq,
        };
        self.listener
            .on_conversation_read_state_changed(to_json_string(&payload));
    }

    pub(crate) async fn notify_read_state_if_subscribed(&self, conversation_id: &str) {
        if self.subscriptions.is_subscribed(conversation_id) {
            self.notify_read_state(conversation_id).await;
        }
    }

    pub(crate) fn emit_conversation_changed(&self, conversation_ids: Vec<String>) {
        let _ = self
            .bus
            .conversation_changed
            .send(Arc::new(ConversationChanged { conversation_ids }));
    }

    pub(crate) fn emit_latest_message_read(&self, conversation_id: &str) {
        let _ = self.bus.latest_message_read.send(Arc::new(LatestMessageRead {
            conversation_id: conversation_id.to_string(),
        }));
    }

    pub(crate) fn emit_total_unread_changed(&self) {
        let _ = self.bus.total_unread_changed.send(Arc::new(TotalUnreadChanged));
    }
}
