//! Resident to officer chat relay.
//!
//! Rooms, history, and presence live in this process. When a message names an officer who is
//! not connected, the [`BotResponder`] may answer on their behalf.

pub mod bot;
pub mod presence;
pub mod relay;
pub mod router;

pub use bot::{BotResponder, KeywordBot};
pub use presence::{InMemoryPresence, PresenceRegistry};
pub use relay::{ChatError, ChatMessage, ChatRelay, BOT_SENDER, MAX_BODY_CHARS};
pub use router::chat_router;
