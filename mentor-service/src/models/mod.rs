pub mod conversation;
pub mod job;

pub use conversation::{Conversation, ConversationMessage};
pub use job::{JobListing, JobMatch};
