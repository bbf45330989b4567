//! Chat messages and the bounded local history.

mod history;
mod model;

pub use history::{MAX_HISTORY_ENTRIES, MessageHistory};
pub use model::{Message, MessageType};
