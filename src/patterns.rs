//! Field extraction rules.
//!
//! Every semantic field owns an ordered list of [`Rule`]s. Rules are tried in
//! declaration order and the first one that matches a line wins; later rules are
//! never consulted for that field. All rules are line-local.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Timestamp,
    Level,
    HttpMethod,
    Path,
    StatusCode,
    ResponseTime,
    IpAddress,
    UserId,
    ErrorMessage,
}

impl Field {
    /// Extraction order used by the line parser.
    pub const ALL: [Field; 9] = [
        Field::Timestamp,
        Field::Level,
        Field::HttpMethod,
        Field::Path,
        Field::StatusCode,
        Field::ResponseTime,
        Field::IpAddress,
        Field::UserId,
        Field::ErrorMessage,
    ];

    pub fn rules(self) -> &'static [Rule] {
        match self {
            Field::Timestamp => TIMESTAMP_RULES.as_slice(),
            Field::Level => LEVEL_RULES.as_slice(),
            Field::HttpMethod => METHOD_RULES.as_slice(),
            Field::Path => PATH_RULES.as_slice(),
            Field::StatusCode => STATUS_RULES.as_slice(),
            Field::ResponseTime => RESPONSE_TIME_RULES.as_slice(),
            Field::IpAddress => IP_RULES.as_slice(),
            Field::UserId => USER_ID_RULES.as_slice(),
            Field::ErrorMessage => ERROR_MESSAGE_RULES.as_slice(),
        }
    }
}

/// One extractor: a pattern, the capture group holding the value, and an
/// optional multiplier applied when the value is read as a number.
#[derive(Debug)]
pub struct Rule {
    pub regex: Regex,
    pub group: usize,
    pub scale: Option<f64>,
}

impl Rule {
    fn new(pattern: &str, group: usize) -> Rule {
        Rule { regex: Regex::new(pattern).unwrap(), group, scale: None }
    }

    fn scaled(pattern: &str, group: usize, scale: f64) -> Rule {
        Rule { scale: Some(scale), ..Rule::new(pattern, group) }
    }

    pub fn capture<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.regex
            .captures(line)
            .and_then(|caps| caps.get(self.group))
            .map(|m| m.as_str())
    }
}

/// A value captured by the winning rule of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capture<'a> {
    pub value: &'a str,
    pub scale: Option<f64>,
}

impl<'a> Capture<'a> {
    /// Numeric reading of the capture with the rule's multiplier applied.
    /// Returns `None` when the text is not a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        let n: f64 = self.value.trim().parse().ok()?;
        let n = n * self.scale.unwrap_or(1.0);
        n.is_finite().then_some(n)
    }
}

/// Runs `rules` in order against `line`; the first match wins.
pub fn first_match<'a>(rules: &[Rule], line: &'a str) -> Option<Capture<'a>> {
    rules.iter().find_map(|rule| {
        rule.capture(line).map(|value| Capture { value, scale: rule.scale })
    })
}

pub fn extract(field: Field, line: &str) -> Option<Capture<'_>> {
    first_match(field.rules(), line)
}

const METHODS: &str = "GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS";

static TIMESTAMP_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        // 2023-04-17T12:34:56.789Z
        Rule::new(r"([0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?(?:Z|[+-][0-9]{2}:?[0-9]{2})?)", 1),
        // [26/Feb/2025:08:48:45 +0100]
        Rule::new(r"\[([0-9]{2}/[A-Za-z]{3}/[0-9]{4}:[0-9]{2}:[0-9]{2}:[0-9]{2}\s[+-][0-9]{4})\]", 1),
        Rule::new(r"([0-9]{4}-[0-9]{2}-[0-9]{2}\s[0-9]{2}:[0-9]{2}:[0-9]{2})", 1),
        // 04/17/2023 12:34:56
        Rule::new(r"([0-9]{2}/[0-9]{2}/[0-9]{4}\s[0-9]{2}:[0-9]{2}:[0-9]{2})", 1),
        Rule::new(r"\b([0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?)\b", 1),
    ]
});

static LEVEL_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"\b(ERROR|WARN|INFO|DEBUG|TRACE|FATAL|CRITICAL|NOTICE)\b", 1),
        Rule::new(r"\[(ERROR|WARN|INFO|DEBUG|TRACE|FATAL|CRITICAL|NOTICE)\]", 1),
    ]
});

static METHOD_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(&format!(r"\b({METHODS})\b"), 1),
        Rule::new(&format!(r"\{{({METHODS})\s"), 1),
    ]
});

static PATH_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"https?://[^\s/$.?#].[^\s]*", 0),
        Rule::new(r#"\s(/[^\s"]*)\s"#, 1),
        // {GET /iapi/LangRes HTTP/1.1}
        Rule::new(&format!(r"\{{(?:{METHODS})\s+([^\s}}]+)"), 1),
    ]
});

static STATUS_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"(?i)\bstatus(?::|=|\s)([0-9]{3})\b", 1),
        Rule::new(r"\}\s+-\s+([0-9]{3})\s+-", 1),
        // Apache: "GET / HTTP/1.1" 200 1234
        Rule::new(r"\s([0-9]{3})\s+[0-9]+\s+", 1),
        Rule::new(r"\scode=([0-9]{3})\b", 1),
    ]
});

static RESPONSE_TIME_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"(?i)\btime(?::|=|\s)([0-9]+(?:\.[0-9]+)?)\b", 1),
        Rule::scaled(r"([0-9]+(?:\.[0-9]+)?)\s*ms\b", 1, 0.001),
        Rule::new(r"\s+-\s+([0-9]+\.[0-9]+)\s+-", 1),
        Rule::new(r"(?i)took\s+([0-9]+(?:\.[0-9]+)?)\s*(?:s|sec|seconds)\b", 1),
    ]
});

static IP_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![Rule::new(r"\b([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})\b", 1)]
});

static USER_ID_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r#"(?i)\buser(?::|=|\s)["']?([^"'\s]+)["']?"#, 1),
        Rule::new(r#"(?i)\bid(?::|=|\s)["']?([^"'\s]+)["']?"#, 1),
        // trailing request id of custom server lines
        Rule::new(r"\s+-\s+-\s+([0-9]+)$", 1),
    ]
});

static ERROR_MESSAGE_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"Error:\s+(.+?)(?:\n|$)", 1),
        Rule::new(r"Exception:\s+(.+?)(?:\n|$)", 1),
        Rule::new(r"(?i)failed[:\s]+(.+?)(?:\n|$)", 1),
        Rule::new(r"(?i)timeout[:\s]+(.+?)(?:\n|$)", 1),
    ]
});

/// Every IPv4-looking token in `line`, in order of appearance.
pub fn ip_addresses(line: &str) -> impl Iterator<Item = &str> {
    IP_RULES.as_slice()[0]
        .regex
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}
