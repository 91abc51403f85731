//! Initialize handshake on both sides of the channel.

use crate::types::{InitializeParams, InitializeResult, MCP_VERSION};

/// Server side: acknowledge a handshake. Always succeeds.
pub fn negotiate(params: Option<InitializeParams>) -> InitializeResult {
    match params {
        Some(params) => {
            if params.protocol_version != MCP_VERSION {
                tracing::warn!(
                    "Client requested protocol version {}, server supports {}. Proceeding with server version.",
                    params.protocol_version,
                    MCP_VERSION
                );
            }
            tracing::info!(
                "Initialized with client: {} v{}",
                params.client_info.name,
                params.client_info.version
            );
        }
        None => tracing::warn!("Initialize request carried no readable client info"),
    }

    InitializeResult::default_result()
}

/// Client side: note a server that answered with a different protocol version.
pub fn check_server_version(result: &InitializeResult, requested: &str) {
    if result.protocol_version != requested {
        tracing::warn!(
            "Server {} answered with protocol version {}, client asked for {requested}",
            result.server_info.name,
            result.protocol_version
        );
    }
    tracing::info!(
        "Connected to server: {} v{}",
        result.server_info.name,
        result.server_info.version
    );
}
