use once_cell::sync::Lazy;
use regex::Regex;

static RE_BRACKET_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[[0-9]{2}/[A-Za-z]{3}/[0-9]{4}:[0-9]{2}:[0-9]{2}:[0-9]{2}\s[+-][0-9]{4}\]").unwrap()
});

static RE_ISO_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}[T ][0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?(?:Z|[+-][0-9]{2}:?[0-9]{2})?").unwrap()
});

static RE_IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\b").unwrap()
});

static RE_LONG_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9]{4,}\b").unwrap()
});

/// Number of leading tokens forming a message pattern key.
pub const PATTERN_TOKENS: usize = 5;

/// Strips the parts of a raw line that vary between otherwise identical entries.
pub fn redact_line(input: &str) -> String {
    // Order matters: timestamps, then IPs, then numeric ids
    let s = RE_BRACKET_TIMESTAMP.replace_all(input, "");
    let s = RE_ISO_TIMESTAMP.replace_all(&s, "");
    let s = RE_IPV4.replace_all(&s, "[IP]");
    let s = RE_LONG_ID.replace_all(&s, "[ID]");
    s.into_owned()
}

/// First [`PATTERN_TOKENS`] whitespace-separated tokens of `message`.
pub fn pattern_key(message: &str) -> Option<String> {
    let key = message
        .split_whitespace()
        .take(PATTERN_TOKENS)
        .collect::<Vec<_>>()
        .join(" ");
    if key.is_empty() { None } else { Some(key) }
}
