/// Per-(conversation, user) read position: the user has read every message
/// up to and including `max_read_seq`. Monotone non-decreasing across all
/// legitimate updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCursor {
    pub conversation_id: String,
    pub user_id: String,
    pub max_read_seq: i64,
}

/// Per-conversation derived aggregate: the minimum cursor across all
/// participants except the logged-in user, or 0 when that set is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadState {
    pub conversation_id: String,
    pub all_read_seq: i64,
}
