//! Application layer for NxChat.
//!
//! Coordinates identity, the conversation state machine, the REST API and the
//! realtime transport into a running widget.

pub mod alert;
pub mod readiness;
pub mod watchdog;
pub mod widget;

pub use alert::{AlertPlayer, NoopAlertPlayer};
pub use widget::{ChatWidget, PageContext, SendRoute, TransferResult, WidgetServices, WidgetUpdate};
