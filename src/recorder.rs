use dashmap::DashMap;

/// Latest known server max seq per conversation. Shared across the sync and
/// ingestion paths; lives for the lifetime of the controller.
#[derive(Debug, Default)]
pub struct MaxSeqRecorder {
    seqs: DashMap<String, i64>,
}

impl MaxSeqRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0 when the conversation has never been reconciled.
    pub fn get(&self, conversation_id: &str) -> i64 {
        self.seqs.get(conversation_id).map(|e| *e).unwrap_or(0)
    }

    pub fn set(&self, conversation_id: &str, max_seq: i64) {
        self.seqs.insert(conversation_id.to_string(), max_seq);
    }
}
