//! Error-message sanitization and safe map merging.
//!
//! # Responsibilities
//! - Reduce arbitrary error text to a short, safe client-facing string
//! - Merge middleware-contributed fields without prototype-pollution keys
//!
//! # Design Decisions
//! - Pattern match is case-insensitive and errs on the side of the fallback
//! - Only the first line survives (no stack traces)
//! - Path-like tokens are redacted rather than rejected wholesale

use serde_json::Value;

use crate::node::Props;

/// Substrings that force the fallback message.
const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "authorization",
    "bearer",
    "private key",
    "connection string",
    "credential",
];

/// Keys refused by `safe_merge`.
const BLOCKED_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

/// Longest message forwarded to a client, in characters.
const MAX_MESSAGE_LEN: usize = 160;

/// Reduce an error message to a short, safe string.
///
/// Never returns stack traces, file paths or anything matching a sensitive
/// pattern; long messages are truncated.
pub fn sanitize_error_message(message: &str, fallback: &str) -> String {
    let first_line = message.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return fallback.to_string();
    }

    let lowered = first_line.to_lowercase();
    if SENSITIVE_PATTERNS.iter().any(|p| lowered.contains(p)) {
        return fallback.to_string();
    }

    let redacted: Vec<&str> = first_line
        .split_whitespace()
        .map(|token| if looks_like_path(token) { "[path]" } else { token })
        .collect();
    let cleaned = redacted.join(" ");

    if cleaned.chars().count() > MAX_MESSAGE_LEN {
        let truncated: String = cleaned.chars().take(MAX_MESSAGE_LEN).collect();
        format!("{truncated}…")
    } else {
        cleaned
    }
}

fn looks_like_path(token: &str) -> bool {
    token.matches('/').count() >= 2 || token.matches('\\').count() >= 2
}

/// Merge `source` into `target`, refusing prototype-pollution keys and
/// deep-merging nested objects. Scalar conflicts are last-write-wins.
pub fn safe_merge(target: &mut Props, source: &Props) {
    for (key, value) in source {
        if BLOCKED_KEYS.contains(&key.as_str()) {
            tracing::warn!(key = %key, "Refusing to merge unsafe key");
            continue;
        }
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                safe_merge(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
