// Reconciliation sweeps: unread counters against the server's seq pairs,
// authoritative cursor installation, and the post-reconnect repaint.

mod common;

use common::*;
use readstate::store::traits::{ConversationStore, ReadStore};
use readstate::types::cursor::{ReadCursor, ReadState};
use readstate::types::receipts::ReadStateChanged;
use std::time::Duration;

const CONV: &str = "si_A_B";
const SELF: &str = "A";

async fn seed_single_chat(h: &Harness, unread: i32, cursor_seq: i64) {
    h.db.put_conversation(single_conversation(
        CONV,
        "B",
        unread,
        &latest_message("m2", 2, false),
    ))
    .await;
    if cursor_seq > 0 {
        h.db.upsert_read_cursor(ReadCursor {
            conversation_id: CONV.to_string(),
            user_id: "B".to_string(),
            max_read_seq: cursor_seq,
        })
        .await
        .unwrap();
        h.db.upsert_read_state(ReadState {
            conversation_id: CONV.to_string(),
            all_read_seq: cursor_seq,
        })
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn reconnect_reconciliation_restores_server_truth() {
    let h = harness(SELF);
    seed_single_chat(&h, 4, 2).await;
    h.controller.subscribe_conversation(CONV);
    h.server.seed_seq_pair(CONV, 10, 10);
    h.server.seed_cursors(CONV, &[("B", 6)]);

    let mut conv_changed_rx = h.controller.commands().conversation_changed.subscribe();
    let mut total_unread_rx = h.controller.commands().total_unread_changed.subscribe();

    h.controller
        .sync_all_conversation_has_read_seqs()
        .await
        .unwrap();

    assert_eq!(h.db.get_conversation(CONV).await.unwrap().unread_count, 0);
    assert_eq!(h.controller.max_seq_recorder().get(CONV), 10);
    assert_eq!(
        conv_changed_rx.try_recv().unwrap().conversation_ids,
        vec![CONV.to_string()]
    );
    assert!(total_unread_rx.try_recv().is_ok());

    h.controller
        .sync_read_cursors(&[CONV.to_string()])
        .await
        .unwrap();

    assert_eq!(h.db.get_read_cursor(CONV, "B").await.unwrap().max_read_seq, 6);
    assert_eq!(h.db.get_read_state(CONV).await.unwrap().all_read_seq, 6);

    let changes = h.listener.read_state_changes();
    assert_eq!(changes.len(), 1);
    let change: ReadStateChanged = serde_json::from_str(&changes[0]).unwrap();
    assert_eq!(change.conversation_id, CONV);
    assert_eq!(change.all_read_seq, 6);
}

#[tokio::test]
async fn repeated_cursor_sync_is_idempotent() {
    let h = harness(SELF);
    seed_single_chat(&h, 0, 2).await;
    h.controller.subscribe_conversation(CONV);
    h.server.seed_cursors(CONV, &[("B", 6)]);

    h.controller
        .sync_read_cursors(&[CONV.to_string()])
        .await
        .unwrap();
    h.controller
        .sync_read_cursors(&[CONV.to_string()])
        .await
        .unwrap();

    assert_eq!(h.db.get_read_cursor(CONV, "B").await.unwrap().max_read_seq, 6);
    assert_eq!(h.db.get_read_state(CONV).await.unwrap().all_read_seq, 6);
    assert_eq!(h.listener.read_state_changes().len(), 1);
}

#[tokio::test]
async fn server_cursors_never_move_local_ones_backward() {
    let h = harness(SELF);
    seed_single_chat(&h, 0, 8).await;
    h.server.seed_cursors(CONV, &[("B", 6)]);

    h.controller
        .sync_read_cursors(&[CONV.to_string()])
        .await
        .unwrap();

    assert_eq!(h.db.get_read_cursor(CONV, "B").await.unwrap().max_read_seq, 8);
}

#[tokio::test]
async fn own_cursor_rows_from_the_server_are_skipped() {
    let h = harness(SELF);
    seed_single_chat(&h, 0, 0).await;
    h.server.seed_cursors(CONV, &[(SELF, 9), ("B", 6)]);

    h.controller
        .sync_read_cursors(&[CONV.to_string()])
        .await
        .unwrap();

    assert!(h.db.get_read_cursor(CONV, SELF).await.is_err());
    assert_eq!(h.db.get_read_cursor(CONV, "B").await.unwrap().max_read_seq, 6);
}

#[tokio::test]
async fn unknown_conversations_are_fetched_and_inserted_with_computed_unread() {
    let h = harness(SELF);
    let unknown = "si_A_C";
    h.server.seed_seq_pair(unknown, 5, 3);
    h.server.conversations.lock().unwrap().push(single_conversation(
        unknown,
        "C",
        0,
        &latest_message("m5", 5, false),
    ));

    h.controller
        .sync_all_conversation_has_read_seqs()
        .await
        .unwrap();

    assert!(h
        .server
        .calls()
        .contains(&ServerCall::GetConversations {
            conversation_ids: vec![unknown.to_string()],
        }));
    let inserted = h.db.get_conversation(unknown).await.unwrap();
    assert_eq!(inserted.unread_count, 2);
}

#[tokio::test]
async fn reconnect_repaints_subscribed_conversations_even_without_changes() {
    let h = harness(SELF);
    seed_single_chat(&h, 0, 6).await;
    h.controller.subscribe_conversation(CONV);
    // The server agrees with local state, so nothing moves.
    h.server.seed_seq_pair(CONV, 2, 2);
    h.server.seed_cursors(CONV, &[("B", 6)]);

    h.controller.sync_on_reconnect().await.unwrap();

    let changes = h.listener.read_state_changes();
    assert_eq!(changes.len(), 1);
    let change: ReadStateChanged = serde_json::from_str(&changes[0]).unwrap();
    assert_eq!(change.all_read_seq, 6);
}

#[tokio::test]
async fn reconnect_syncs_single_chats_and_only_the_most_recent_groups() {
    let h = harness(SELF);
    h.db.put_conversation(single_conversation(
        CONV,
        "B",
        0,
        &latest_message("m1", 1, true),
    ))
    .await;
    for i in 1..=12 {
        h.db.put_conversation(group_conversation(
            &format!("sg_g{i}"),
            &format!("g{i}"),
            0,
            i,
        ))
        .await;
    }

    h.controller.sync_on_reconnect().await.unwrap();

    let cursor_call = h
        .server
        .calls()
        .into_iter()
        .find_map(|call| match call {
            ServerCall::GetReadCursors { conversation_ids } => Some(conversation_ids),
            _ => None,
        })
        .expect("cursor sync should run");

    assert_eq!(cursor_call.len(), 11);
    assert!(cursor_call.contains(&CONV.to_string()));
    // The two least recently active groups are left to the periodic sweep.
    assert!(!cursor_call.contains(&"sg_g1".to_string()));
    assert!(!cursor_call.contains(&"sg_g2".to_string()));
    assert!(cursor_call.contains(&"sg_g12".to_string()));
}

#[tokio::test]
async fn ensure_read_cursors_is_quiet_when_every_member_is_covered() {
    let h = harness(SELF);
    h.db.put_conversation(group_conversation("sg_G", "G", 0, 0)).await;
    h.db.put_group_members("G", vec![SELF.to_string(), "U1".to_string()])
        .await;
    h.db.upsert_read_cursor(ReadCursor {
        conversation_id: "sg_G".to_string(),
        user_id: "U1".to_string(),
        max_read_seq: 3,
    })
    .await
    .unwrap();

    h.controller.ensure_read_cursors("sg_G").await.unwrap();
    assert!(h.server.calls().is_empty());
}

#[tokio::test]
async fn ensure_read_cursors_syncs_when_a_member_is_missing() {
    let h = harness(SELF);
    h.db.put_conversation(group_conversation("sg_G", "G", 0, 0)).await;
    h.db.put_group_members(
        "G",
        vec![SELF.to_string(), "U1".to_string(), "U2".to_string()],
    )
    .await;
    h.db.upsert_read_cursor(ReadCursor {
        conversation_id: "sg_G".to_string(),
        user_id: "U1".to_string(),
        max_read_seq: 3,
    })
    .await
    .unwrap();
    h.server.seed_cursors("sg_G", &[("U1", 3), ("U2", 1)]);

    h.controller.ensure_read_cursors("sg_G").await.unwrap();

    assert!(h
        .server
        .calls()
        .contains(&ServerCall::GetReadCursors {
            conversation_ids: vec!["sg_G".to_string()],
        }));
    assert_eq!(
        h.db.get_read_cursor("sg_G", "U2").await.unwrap().max_read_seq,
        1
    );
}

#[tokio::test(start_paused = true)]
async fn ensure_read_cursors_retries_once_when_the_conversation_is_late() {
    let h = harness(SELF);
    // The conversation row has not arrived yet; the sync happens on a
    // delayed retry instead of failing.
    h.server.seed_cursors(CONV, &[("B", 6)]);

    h.controller.ensure_read_cursors(CONV).await.unwrap();
    assert!(h.server.calls().is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(
        h.server.calls(),
        vec![ServerCall::GetReadCursors {
            conversation_ids: vec![CONV.to_string()],
        }]
    );
    assert_eq!(h.db.get_read_cursor(CONV, "B").await.unwrap().max_read_seq, 6);
}
