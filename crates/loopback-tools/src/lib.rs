//! Loopback Tools — reference tool bodies served by the Loopback MCP engine.

pub mod api_call;
pub mod echo;
pub mod ping;
pub mod types;

pub use api_call::{
    call_api, http_client, render_failure, render_response, ApiCallRequest, ApiResponse,
    HttpMethod,
};
pub use echo::echo;
pub use ping::{pong, DEFAULT_PING_TARGET};
pub use types::*;
