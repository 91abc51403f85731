//! Loopback MCP — an in-process Model Context Protocol client and server
//! joined by a duplex channel.

pub mod config;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{resolve_request_timeout, ClientConfig};
pub use protocol::Dispatcher;
pub use session::{Session, SessionState};
pub use tools::{Tool, ToolRegistry};
pub use transport::{duplex, Channel, DuplexPort, Server, ServerHandle};
pub use types::{McpError, McpResult};
