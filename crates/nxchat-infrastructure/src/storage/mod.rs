//! `ClientStorage` backends.

pub mod atomic_json;
mod file_storage;
mod memory_storage;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
pub use file_storage::FileClientStorage;
pub use memory_storage::InMemoryClientStorage;
