//! Conversation state machine.
//!
//! # Module Structure
//!
//! - `status`: server-supplied `SessionStatusResult` and its classification into a `Flow`
//! - `state`: the `ConversationState` flags
//! - `reducer`: `ConversationState::apply`, the only place the flags change
//!
//! # Usage
//!
//! ```
//! use nxchat_core::conversation::{ConversationState, Flow, SessionStatusResult, Transition};
//!
//! let status = SessionStatusResult::new_visitor();
//! let (state, effects) = ConversationState::default().apply(Transition::Enter(Flow::classify(&status)));
//! assert!(!state.agent_joined);
//! assert!(!effects.is_empty());
//! ```

mod reducer;
mod state;
mod status;

pub use reducer::{Effect, Transition, notices};
pub use state::ConversationState;
pub use status::{AgentId, Flow, SessionStatus, SessionStatusResult};
