//! Network adapters for the NxChat widget: the REST client and the Socket.IO
//! transport.

pub mod http_api;
pub mod socketio;

pub use http_api::HttpWidgetApi;
pub use socketio::SocketIoClient;
