//! Chat assistant: transport to the chat service and per-surface conversation state.

/// Conversation state machine
pub mod session;
/// Chat service transport
pub mod transport;
/// Messages, requests and replies
pub mod types;

pub use session::{ChatSession, ChatSnapshot, ChatState, PatientContextMode, SendOutcome};
pub use transport::{CHAT_TIMEOUT, ChatClient, ChatConfig, ChatTransport};
pub use types::{
    ApiHealth, ChatFailure, ChatMessage, ChatReply, ChatResult, HistoryEntry, PatientInfo, Role,
};
