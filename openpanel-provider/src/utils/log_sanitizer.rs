//! Log sanitization utilities
//!
//! Keeps credentials (account passwords, admin passwords, bearer tokens) and
//! oversized response bodies out of debug/error logs.

use serde_json::Value;

/// Maximum number of bytes to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// Payload fields whose values are replaced before logging.
pub const SENSITIVE_FIELDS: [&str; 2] = ["password", "admin_password"];

/// Placeholder written in place of a sensitive value.
pub const MASK: &str = "***";

/// MSRV-compatible replacement for `str::floor_char_boundary` (stable since 1.91.0).
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Cut `s` to at most `limit` bytes without splitting a UTF-8 character.
pub fn truncate_to(s: &str, limit: usize) -> &str {
    &s[..floor_char_boundary(s, limit)]
}

/// Truncate a string for safe logging.
///
/// Returns the original string if it's within the limit,
/// otherwise returns the first `TRUNCATE_LIMIT` bytes with a suffix
/// indicating the total length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            truncate_to(s, TRUNCATE_LIMIT),
            s.len()
        )
    }
}

/// Render a request payload for logging with sensitive top-level fields masked.
///
/// Returns an empty string for a missing payload.
pub fn mask_payload(payload: Option<&Value>) -> String {
    let Some(payload) = payload else {
        return String::new();
    };

    let mut masked = payload.clone();
    if let Value::Object(map) = &mut masked {
        for field in SENSITIVE_FIELDS {
            if let Some(value) = map.get_mut(field) {
                *value = Value::String(MASK.to_string());
            }
        }
    }

    truncate_for_log(&masked.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_string_unchanged() {
        let s = "hello world";
        assert_eq!(truncate_for_log(s), s);
    }

    #[test]
    fn exactly_at_limit() {
        let s = "a".repeat(TRUNCATE_LIMIT);
        assert_eq!(truncate_for_log(&s), s);
    }

    #[test]
    fn over_limit_truncated() {
        let s = "a".repeat(TRUNCATE_LIMIT + 100);
        let result = truncate_for_log(&s);
        assert!(result.contains("... [truncated, total"));
        assert!(result.contains(&format!("{} bytes]", TRUNCATE_LIMIT + 100)));
        assert!(result.len() < s.len());
    }

    #[test]
    fn multibyte_chars_safe() {
        let s = "é".repeat(200);
        assert_eq!(truncate_to(&s, 255).len(), 254);
        assert!(truncate_for_log(&s).contains("... [truncated, total"));
    }

    #[test]
    fn masks_password_fields() {
        let payload = json!({"username": "bob", "password": "hunter2", "admin_password": "root"});
        let logged = mask_payload(Some(&payload));
        assert!(logged.contains("\"username\":\"bob\""));
        assert!(!logged.contains("hunter2"));
        assert!(!logged.contains("root"));
        assert_eq!(logged.matches(MASK).count(), 2);
    }

    #[test]
    fn missing_payload_is_empty() {
        assert_eq!(mask_payload(None), "");
    }

    #[test]
    fn non_object_payload_passes_through() {
        assert_eq!(mask_payload(Some(&json!("plain"))), "\"plain\"");
    }
}
