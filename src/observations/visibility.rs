//! Decoding of raw station visibility tokens.

/// Distance values at or above this are the observing network's "missing" sentinel.
pub const MISSING_VISIBILITY_SENTINEL: u64 = 99_999;

/// Parses a raw visibility token into meters.
///
/// Tokens look like `"000400,1,N,1"`: the first comma-separated field is the distance in
/// meters and must consist of ASCII digits only. The trailing quality and variability
/// fields are ignored. Returns `None` for unparsable tokens and for the missing sentinel
/// (values `>= 99999`).
///
/// # Examples
///
/// ```
/// use fogverify::parse_visibility_token;
///
/// assert_eq!(parse_visibility_token("000400,1,N,1"), Some(400.0));
/// assert_eq!(parse_visibility_token("099999,1,N,1"), None);
/// assert_eq!(parse_visibility_token("9999X"), None);
/// ```
pub fn parse_visibility_token(token: &str) -> Option<f64> {
    let distance = token.trim().split(',').next()?.trim();
    if distance.is_empty() || !distance.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let meters: u64 = distance.parse().ok()?;
    (meters < MISSING_VISIBILITY_SENTINEL).then_some(meters as f64)
}

/// Clamps a visibility to the configured display cap. Values above the cap are kept
/// at the cap, never discarded.
pub fn cap_visibility(visibility_m: f64, cap_m: f64) -> f64 {
    visibility_m.min(cap_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!(parse_visibility_token("000400,1,N,1"), Some(400.0));
        assert_eq!(parse_visibility_token("016000,1,9,9"), Some(16000.0));
        assert_eq!(parse_visibility_token("000000,1,N,1"), Some(0.0));
        assert_eq!(parse_visibility_token(" 2500 "), Some(2500.0));
    }

    #[test]
    fn test_parse_missing_and_garbage() {
        assert_eq!(parse_visibility_token("099999,1,N,1"), None);
        assert_eq!(parse_visibility_token("999999,9,9,9"), None);
        assert_eq!(parse_visibility_token(""), None);
        assert_eq!(parse_visibility_token(",1,N,1"), None);
        assert_eq!(parse_visibility_token("-00400,1,N,1"), None);
        assert_eq!(parse_visibility_token("4.5e2"), None);
        assert_eq!(parse_visibility_token("99999999999999999999999"), None);
    }

    #[test]
    fn test_cap() {
        assert_eq!(cap_visibility(16000.0, 10000.0), 10000.0);
        assert_eq!(cap_visibility(800.0, 10000.0), 800.0);
    }
}
