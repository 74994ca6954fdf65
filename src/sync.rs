use crate::controller::ReadStateController;
use crate::error::Result;
use crate::store::error::StoreError;
use crate::store::traits::{ConversationStore, GroupStore, ReadStore};
use crate::types::conversation::{Conversation, ConversationType};
use crate::types::cursor::{ReadCursor, ReadState};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Groups beyond this many are left to the periodic sweep after a
/// reconnect; only the most recently active ones are refreshed eagerly.
const RECONNECT_GROUP_SYNC_LIMIT: usize = 10;

impl ReadStateController {
    /// Pulls the authoritative (max seq, has-read seq) pair for every
    /// conversation and reconciles local unread counters. Conversations the
    /// catalogue does not know yet are fetched from the server and inserted
    /// with their computed unread count.
    pub async fn sync_all_conversation_has_read_seqs(&self) -> Result<()> {
        let seqs = self.api.get_conversations_has_read_and_max_seq().await?;
        if seqs.is_empty() {
            return Ok(());
        }

        let local: HashMap<String, Conversation> = self
            .db
            .get_all_conversations()
            .await?
            .into_iter()
            .map(|c| (c.conversation_id.clone(), c))
            .collect();

        let mut changed_ids = Vec::new();
        let mut unknown_ids = Vec::new();
        for (conversation_id, pair) in &seqs {
            self.max_seq_recorder.set(conversation_id, pair.max_seq);

            let unread = if pair.max_seq < pair.has_read_seq {
                warn!(
                    target: "ReadState/Sync",
                    "server has-read {} ahead of max {} in {conversation_id}",
                    pair.has_read_seq, pair.max_seq
                );
                0
            } else {
                (pair.max_seq - pair.has_read_seq) as i32
            };

            match local.get(conversation_id) {
                Some(conversation) if conversation.unread_count != unread => {
                    if let Err(e) = self.db.set_unread_count(conversation_id, unread).await {
                        warn!(target: "ReadState/Sync", "failed to update unread of {conversation_id}: {e}");
                        continue;
                    }
                    changed_ids.push(conversation_id.clone());
                }
                Some(_) => {}
                None => unknown_ids.push(conversation_id.clone()),
            }
        }

        if !unknown_ids.is_empty() {
            let mut fetched = self.api.get_conversations_by_ids(&unknown_ids).await?;
            for conversation in &mut fetched {
                if let Some(pair) = seqs.get(&conversation.conversation_id) {
                    conversation.unread_count = (pair.max_seq - pair.has_read_seq).max(0) as i32;
                }
            }
            if let Err(e) = self.db.batch_insert_conversations(fetched).await {
                warn!(target: "ReadState/Sync", "bulk insert of fetched conversations failed: {e}");
            }
        }

        if !changed_ids.is_empty() {
            self.emit_conversation_changed(changed_ids);
            self.emit_total_unread_changed();
        }
        Ok(())
    }

    /// Installs the server's authoritative cursor set for each conversation
    /// and refreshes the aggregate where anything moved. The logged-in
    /// user's own rows are skipped; local cursors only ever move forward.
    pub async fn sync_read_cursors(&self, conversation_ids: &[String]) -> Result<()> {
        if conversation_ids.is_empty() {
            return Ok(());
        }
        debug!(target: "ReadState/Sync", "syncing cursors for {} conversations", conversation_ids.len());
        let response = self
            .api
            .get_conversation_read_cursors(conversation_ids)
            .await?;

        for conversation_cursors in response {
            let conversation_id = conversation_cursors.conversation_id;
            let mut has_changes = false;

            for cursor in conversation_cursors.cursors {
                if cursor.user_id == self.login_user_id {
                    continue;
                }
                let install = match self
                    .db
                    .get_read_cursor(&conversation_id, &cursor.user_id)
                    .await
                {
                    Ok(existing) => cursor.max_read_seq > existing.max_read_seq,
                    Err(StoreError::NotFound(_)) => true,
                    Err(e) => {
                        warn!(
                            target: "ReadState/Sync",
                            "cursor lookup failed for {conversation_id}/{}: {e}",
                            cursor.user_id
                        );
                        continue;
                    }
                };
                if !install {
                    continue;
                }
                match self
                    .db
                    .upsert_read_cursor(ReadCursor {
                        conversation_id: conversation_id.clone(),
                        user_id: cursor.user_id.clone(),
                        max_read_seq: cursor.max_read_seq,
                    })
                    .await
                {
                    Ok(()) => has_changes = true,
                    Err(e) => warn!(
                        target: "ReadState/Sync",
                        "failed to install cursor {conversation_id}/{}: {e}",
                        cursor.user_id
                    ),
                }
            }

            if has_changes {
                self.refresh_read_state(&conversation_id).await;
            }
        }
        Ok(())
    }

    /// Rescans the cursor set, persists the aggregate when it moved, and
    /// notifies the UI if the conversation is subscribed.
    pub(crate) async fn refresh_read_state(&self, conversation_id: &str) {
        let new_all_read_seq = match self
            .db
            .all_read_seq_excluding(conversation_id, &self.login_user_id)
            .await
        {
            Ok(seq) => seq,
            Err(e) => {
                warn!(target: "ReadState/Sync", "aggregate scan failed for {conversation_id}: {e}");
                return;
            }
        };
        let old_all_read_seq = match self.db.get_read_state(conversation_id).await {
            Ok(state) => state.all_read_seq,
            Err(StoreError::NotFound(_)) => 0,
            Err(e) => {
                warn!(target: "ReadState/Sync", "failed to load read state of {conversation_id}: {e}");
                return;
            }
        };
        if new_all_read_seq == old_all_read_seq {
            return;
        }
        if let Err(e) = self
            .db
            .upsert_read_state(ReadState {
                conversation_id: conversation_id.to_string(),
                all_read_seq: new_all_read_seq,
            })
            .await
        {
            warn!(target: "ReadState/Sync", "failed to store read state of {conversation_id}: {e}");
            return;
        }
        self.notify_read_state_if_subscribed(conversation_id).await;
    }

    /// Full resynchronisation after a connectivity gap: unread counters
    /// first, then cursors for every single chat and the most recently
    /// active groups, then a repaint of every subscribed conversation
    /// whether or not its aggregate moved.
    pub async fn sync_on_reconnect(&self) -> Result<()> {
        self.sync_all_conversation_has_read_seqs().await?;

        let conversations = self.db.get_all_conversations().await?;
        let mut ids: Vec<String> = conversations
            .iter()
            .filter(|c| c.conversation_type == ConversationType::SingleChat)
            .map(|c| c.conversation_id.clone())
            .collect();
        let mut groups: Vec<&Conversation> = conversations
            .iter()
            .filter(|c| c.conversation_type == ConversationType::ReadGroupChat)
            .collect();
        groups.sort_by(|a, b| b.latest_msg_send_time.cmp(&a.latest_msg_send_time));
        ids.extend(
            groups
                .into_iter()
                .take(RECONNECT_GROUP_SYNC_LIMIT)
                .map(|c| c.conversation_id.clone()),
        );

        if !ids.is_empty() {
            if let Err(e) = self.sync_read_cursors(&ids).await {
                warn!(target: "ReadState/Sync", "cursor sync on reconnect failed: {e}");
            }
        }

        for conversation_id in self.subscriptions.snapshot() {
            self.notify_read_state(&conversation_id).await;
        }
        Ok(())
    }

    /// Verifies that every expected participant has a locally stored
    /// cursor, syncing from the server when any are missing.
    ///
    /// The conversation row itself may not have arrived yet when this runs
    /// off a notification (creation notices can be reordered); in that case
    /// the sync is retried once after a second and then abandoned.
    pub async fn ensure_read_cursors(self: &Arc<Self>, conversation_id: &str) -> Result<()> {
        let conversation = match self.db.get_conversation(conversation_id).await {
            Ok(conversation) => conversation,
            Err(StoreError::NotFound(_)) => {
                debug!(
                    target: "ReadState/Sync",
                    "conversation {conversation_id} not known yet, scheduling delayed cursor sync"
                );
                let controller = Arc::clone(self);
                let conversation_id = conversation_id.to_string();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    if let Err(e) = controller
                        .sync_read_cursors(&[conversation_id.clone()])
                        .await
                    {
                        warn!(
                            target: "ReadState/Sync",
                            "delayed cursor sync failed for {conversation_id}: {e}"
                        );
                    }
                });
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let expected = self.expected_cursor_members(&conversation).await?;
        if expected.is_empty() {
            return Ok(());
        }

        let existing: HashSet<String> = self
            .db
            .read_cursors(conversation_id)
            .await?
            .into_iter()
            .map(|cursor| cursor.user_id)
            .collect();
        if expected.iter().all(|member| existing.contains(member)) {
            return Ok(());
        }
        self.sync_read_cursors(&[conversation_id.to_string()]).await
    }

    /// The participants whose cursors the conversation should carry: the
    /// peer for a single chat, everyone but the logged-in user for a group.
    async fn expected_cursor_members(&self, conversation: &Conversation) -> Result<Vec<String>> {
        match conversation.conversation_type {
            ConversationType::SingleChat => Ok(vec![conversation.user_id.clone()]),
            ConversationType::ReadGroupChat => {
                let members = self.db.group_member_ids(&conversation.group_id).await?;
                Ok(members
                    .into_iter()
                    .filter(|user_id| user_id != &self.login_user_id)
                    .collect())
            }
            ConversationType::Notification => Ok(Vec::new()),
        }
    }
}
