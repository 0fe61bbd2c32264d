//! Conversation-state synchronization: delta computation and event
//! reconciliation.

pub mod delta;
pub mod synchronizer;

pub use delta::{ConversationDelta, FieldChange, TagChanges};
pub use synchronizer::{ConversationSynchronizer, SyncOutcome};
