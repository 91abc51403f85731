//! Echo — hands the caller's message straight back.

/// Prefix put in front of every echoed message.
pub const ECHO_PREFIX: &str = "Echo: ";

pub fn echo(message: &str) -> String {
    format!("{ECHO_PREFIX}{message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_prefixes_message() {
        assert_eq!(echo("hello"), "Echo: hello");
    }

    #[test]
    fn test_echo_keeps_empty_and_unicode() {
        assert_eq!(echo(""), "Echo: ");
        assert_eq!(echo("日本語 ✓"), "Echo: 日本語 ✓");
    }
}
