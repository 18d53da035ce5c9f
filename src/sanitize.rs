//! Credential redaction for externally visible error text
//!
//! Every error string that reaches a user-facing surface or is persisted in a
//! run record passes through `redact_credentials` first. The transform is
//! idempotent: sanitizing already-sanitized text changes nothing.

use std::sync::OnceLock;

use regex::Regex;

/// Replacement written over any credential-shaped substring.
pub const REDACTED: &str = "password=[REDACTED]";

fn credential_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)password\s*[:=]\s*['"]?[^'"\s]+['"]?"#)
            .expect("credential pattern is a valid regex")
    })
}

/// Redacts `password[:=]...` shaped substrings to a fixed placeholder.
pub fn redact_credentials(text: &str) -> String {
    credential_pattern().replace_all(text, REDACTED).to_string()
}
