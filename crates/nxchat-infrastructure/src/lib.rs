//! Infrastructure for the NxChat widget client: storage backends, paths and
//! configuration loading.

pub mod config_loader;
pub mod paths;
pub mod storage;

pub use crate::config_loader::load_config;
pub use crate::paths::NxChatPaths;
pub use crate::storage::{FileClientStorage, InMemoryClientStorage};
