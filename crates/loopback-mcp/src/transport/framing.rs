//! Message framing — one JSON document per frame.

use crate::types::{Envelope, McpError, McpResult};

/// Parse a single frame as an envelope.
pub fn parse_envelope(frame: &str) -> McpResult<Envelope> {
    let trimmed = frame.trim();
    if trimmed.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }

    serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))
}

/// Serialize an envelope into a frame.
pub fn encode_envelope(envelope: &Envelope) -> McpResult<String> {
    serde_json::to_string(envelope).map_err(McpError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse_envelope(r#"{"broken":"#).unwrap_err();
        assert_eq!(err.code(), -32700);
        assert!(parse_envelope("   ").is_err());
    }

    #[test]
    fn test_encode_then_parse() {
        let env = Envelope::request(3.into(), "tools/list", None);
        let frame = encode_envelope(&env).unwrap();
        assert!(!frame.contains('\n'));
        assert_eq!(parse_envelope(&frame).unwrap(), env);
    }
}
