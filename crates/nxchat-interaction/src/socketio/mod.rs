//! Minimal Socket.IO v4 client for the widget's realtime channel.

mod client;
pub mod packet;

pub use client::SocketIoClient;
