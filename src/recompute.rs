use crate::store::error::{Result, StoreError};
use crate::store::traits::{Backend, ReadStore};
use crate::types::cursor::{ReadCursor, ReadState};

/// Outcome of pushing a cursor candidate through recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CursorUpdate {
    /// Whether the stored all-read aggregate moved.
    pub changed: bool,
    /// The aggregate after the update; 0 when the update was dropped as a
    /// backward no-op.
    pub all_read_seq: i64,
}

impl CursorUpdate {
    pub(crate) const NOOP: CursorUpdate = CursorUpdate {
        changed: false,
        all_read_seq: 0,
    };
}

/// Applies a candidate read position for (conversation, user) and
/// recomputes the conversation's all-read aggregate.
///
/// Backward and equal candidates are dropped before any write, which makes
/// every caller idempotent under replay. The aggregate is always recomputed
/// with a full scan: cursors and the derived row are not observed
/// atomically across the local and sync paths, so a differential shortcut
/// keyed on the previous minimum holder can persist a stale aggregate.
pub(crate) async fn apply_cursor_update(
    db: &dyn Backend,
    self_user_id: &str,
    conversation_id: &str,
    user_id: &str,
    candidate_seq: i64,
) -> Result<CursorUpdate> {
    match db.get_read_cursor(conversation_id, user_id).await {
        Ok(existing) if candidate_seq <= existing.max_read_seq => return Ok(CursorUpdate::NOOP),
        Ok(_) => {}
        Err(StoreError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    db.upsert_read_cursor(ReadCursor {
        conversation_id: conversation_id.to_string(),
        user_id: user_id.to_string(),
        max_read_seq: candidate_seq,
    })
    .await?;

    let new_all_read_seq = db
        .all_read_seq_excluding(conversation_id, self_user_id)
        .await?;
    let old_all_read_seq = match db.get_read_state(conversation_id).await {
        Ok(state) => state.all_read_seq,
        Err(StoreError::NotFound(_)) => 0,
        Err(e) => return Err(e),
    };

    if new_all_read_seq == old_all_read_seq {
        return Ok(CursorUpdate {
            changed: false,
            all_read_seq: new_all_read_seq,
        });
    }

    db.upsert_read_state(ReadState {
        conversation_id: conversation_id.to_string(),
        all_read_seq: new_all_read_seq,
    })
    .await?;
    Ok(CursorUpdate {
        changed: true,
        all_read_seq: new_all_read_seq,
    })
}
