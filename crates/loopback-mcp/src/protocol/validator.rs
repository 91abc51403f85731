//! JSON-RPC envelope validation.

use crate::types::{Envelope, EnvelopeKind, McpError, McpResult, JSONRPC_VERSION};

/// Check that an envelope is well-formed and report how to interpret it.
pub fn validate_envelope(envelope: &Envelope) -> McpResult<EnvelopeKind> {
    if envelope.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
            envelope.jsonrpc
        )));
    }

    if envelope.method.as_deref() == Some("") {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    match envelope.kind() {
        EnvelopeKind::Malformed => Err(McpError::InvalidRequest(
            "Envelope must carry a method, a result, or an error, and only one of them"
                .to_string(),
        )),
        kind => Ok(kind),
    }
}
