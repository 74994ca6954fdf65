use crate::store::error::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A read sync for a single chat arrived without the seqs it claims to
    /// cover.
    #[error("seq list is empty for conversation {0}")]
    SeqListEmpty(String),

    /// The message at the reported read position is already read; the sync
    /// is a duplicate of work another path already did.
    #[error("read info from self can be ignored")]
    SelfReadIgnored,

    /// The max-seq recorder has no entry for the conversation, so an unread
    /// count cannot be derived. Resolves itself on the next reconciliation.
    #[error("current max seq is 0 for conversation {0}")]
    CurrentMaxSeqZero(String),

    /// A peer-read notification for a single chat carried no seqs.
    #[error("tips seqs is empty")]
    TipsSeqsEmpty,

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// True when the underlying cause is a missing record rather than a
    /// backend failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::Storage(e) if e.is_not_found())
    }

    /// True for returns that signal an ignorable duplicate or an empty
    /// input rather than a fault. Callers surface these to diagnostics but
    /// must not treat them as failures.
    pub fn is_defensive(&self) -> bool {
        matches!(self, CoreError::SelfReadIgnored | CoreError::SeqListEmpty(_))
    }
}
