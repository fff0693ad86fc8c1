//! CLI argument validators.

/// Parse a whole number of seconds no smaller than `min`.
pub fn parse_bounded_secs(s: &str, min: u64, name: &str) -> Result<u64, String> {
    let value: u64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;

    if value < min {
        return Err(format!("{name} must be at least {min} seconds, got {value}"));
    }

    Ok(value)
}

/// Parse a completion timeout in seconds (at least 1).
pub fn parse_timeout_secs(s: &str) -> Result<u64, String> {
    parse_bounded_secs(s, 1, "timeout")
}

/// Parse a poll interval in seconds (at least 1).
pub fn parse_interval_secs(s: &str) -> Result<u64, String> {
    parse_bounded_secs(s, 1, "poll interval")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timeout_valid() {
        assert_eq!(parse_timeout_secs("3600").ok(), Some(3600));
        assert_eq!(parse_timeout_secs(" 1 ").ok(), Some(1));
    }

    #[test]
    fn test_parse_timeout_zero_rejected() {
        let err = parse_timeout_secs("0");
        assert!(err.unwrap_err().contains("at least 1"));
    }

    #[test]
    fn test_parse_interval_invalid_number() {
        assert!(parse_interval_secs("5s").is_err());
        assert!(parse_interval_secs("-5").is_err());
    }
}
