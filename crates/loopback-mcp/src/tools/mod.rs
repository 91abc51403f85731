//! Tool records, the registry that owns them, and the reference tools.

pub mod api_call;
pub mod echo;
pub mod ping;
pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolFuture};
