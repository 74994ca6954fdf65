//! Read-state tracking for an instant-messaging client SDK.
//!
//! Maintains, per conversation, the read position of every relevant
//! participant and derives the aggregate marker the UI renders: the
//! position up to which everyone else has read. The subsystem reacts to
//! local mark-as-read actions, server-pushed read and membership
//! notifications, and runs periodic reconciliation against the server so
//! the local view reconverges after connectivity gaps.
//!
//! The central object is [`ReadStateController`]; storage, transport and
//! the UI listener are injected behind the contracts in [`store::traits`],
//! [`transport`] and [`listener`].

pub mod controller;
pub mod error;
pub mod events;
pub mod listener;
pub mod recorder;
pub mod store;
pub mod subscription;
pub mod transport;
pub mod types;

mod ingest;
mod mark_read;
mod membership;
mod recompute;
mod sync;

pub use controller::ReadStateController;
pub use error::{CoreError, Result};
