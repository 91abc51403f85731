//! Ping — answers with a pong and the sub-second part of the wall clock.

use chrono::{DateTime, Utc};

/// Target named in the reply when the caller gives none.
pub const DEFAULT_PING_TARGET: &str = "server";

/// Build the pong reply for `target` as seen at `now`.
///
/// An empty target counts as missing.
pub fn pong(target: Option<&str>, now: DateTime<Utc>) -> String {
    let target = target
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_PING_TARGET);
    let millis = now.timestamp_subsec_millis();

    format!("Pong from {target}! (Response time: {millis}ms)")
}
