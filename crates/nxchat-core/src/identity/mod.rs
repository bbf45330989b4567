//! Visitor identity.
//!
//! - `model`: `VisitorIdentity` and the id formats
//! - `store`: `IdentityStore`, which reads/creates ids through `ClientStorage`

mod model;
mod store;

pub use model::{VisitorIdentity, generate_session_id, generate_visitor_id};
pub use store::IdentityStore;
