use std::sync::Arc;
use tokio::sync::broadcast;

// Buffer size per command channel; slow subscribers lag rather than block.
const CHANNEL_CAPACITY: usize = 64;

/// Conversations whose stored fields changed; observers should re-read them.
#[derive(Debug, Clone)]
pub struct ConversationChanged {
    pub conversation_ids: Vec<String>,
}

/// The latest message of a conversation became read by its recipient.
#[derive(Debug, Clone)]
pub struct LatestMessageRead {
    pub conversation_id: String,
}

/// The total unread count across all conversations may have moved.
#[derive(Debug, Clone)]
pub struct TotalUnreadChanged;

// Macro to generate the CommandBus fields and constructor.
macro_rules! define_command_bus {
    ($(($field:ident, $type:ty)),* $(,)?) => {
        /// Typed broadcast channels for the conversation-level UI commands.
        /// Each command type gets its own channel so observers subscribe to
        /// exactly what they render.
        #[derive(Debug)]
        pub struct CommandBus {
            $(
                pub $field: broadcast::Sender<$type>,
            )*
        }

        impl CommandBus {
            pub fn new() -> Self {
                Self {
                    $(
                        $field: broadcast::channel(CHANNEL_CAPACITY).0,
                    )*
                }
            }
        }
    };
}

define_command_bus! {
    (conversation_changed, Arc<ConversationChanged>),
    (latest_message_read, Arc<LatestMessageRead>),
    (total_unread_changed, Arc<TotalUnreadChanged>),
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}
