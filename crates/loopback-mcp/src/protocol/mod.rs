//! MCP protocol handling — envelope validation and server-side dispatch.

pub mod dispatcher;
pub mod negotiation;
pub mod validator;

pub use dispatcher::Dispatcher;
