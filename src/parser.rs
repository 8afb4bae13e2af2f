//! Parsing of nginx access-log lines written with the `main` format:
//!
//! ```text
//! log_format main '$remote_addr - $remote_user [$time_local] "$request" '
//!                 '$status $body_bytes_sent "$http_referer" '
//!                 '"$http_user_agent" "$http_x_forwarded_for"'
//!                 ' $http_x_ab_network_type'
//!                 ' $request_time $upstream_response_time $request_length $bytes_sent';
//! ```
//!
//! Example:
//! ```text
//! 223.104.3.182 - - [30/Jan/2015:10:15:44 +0800] "POST /hot/feed/list HTTP/1.1" 200 423 "-" "UA-string" "-" - 0.019 0.019 622 616
//! ```

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

/// The fields of an access-log line, in the order they appear.
pub const FIELD_NAMES: [&str; 14] = [
    "remote_addr",
    "remote_user",
    "time_local",
    "request",
    "status",
    "body_bytes_sent",
    "http_referer",
    "http_user_agent",
    "http_x_forwarded_for",
    "http_x_ab_network_type",
    "request_time",
    "upstream_response_time",
    "request_length",
    "bytes_sent",
];

/// Regex for one access-log line. Fields are separated by runs of whitespace,
/// and the whole line must match, save for trailing whitespace.
pub const ACCESS_LOG_PATTERN: &str = concat!(
    r"^(?P<remote_addr>\S+)",
    r"\s+\S+",
    r"\s+(?P<remote_user>\S+)",
    r"\s+\[(?P<time_local>.+)\]",
    r#"\s+"(?P<request>.+)""#,
    r"\s+(?P<status>[0-9]+)",
    r"\s+(?P<body_bytes_sent>\S+)",
    r#"\s+"(?P<http_referer>.*)""#,
    r#"\s+"(?P<http_user_agent>.*)""#,
    r#"\s+"(?P<http_x_forwarded_for>.*)""#,
    r"\s+(?P<http_x_ab_network_type>\S+)",
    r"\s+(?P<request_time>\S+)",
    r"\s+(?P<upstream_response_time>\S+)",
    r"\s+(?P<request_length>\S+)",
    r"\s+(?P<bytes_sent>\S+)",
    r"\s*\z",
);

static ACCESS_LOG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(ACCESS_LOG_PATTERN).expect("access log pattern is valid"));

/// Fields captured from one access-log line. Values are the raw matched text.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct ParsedRecord {
    pub remote_addr: String,
    pub remote_user: String,
    pub time_local: String,
    pub request: String,
    pub status: String,
    pub body_bytes_sent: String,
    pub http_referer: String,
    pub http_user_agent: String,
    pub http_x_forwarded_for: String,
    pub http_x_ab_network_type: String,
    pub request_time: String,
    pub upstream_response_time: String,
    pub request_length: String,
    pub bytes_sent: String,
}

impl ParsedRecord {
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let field = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

        Some(ParsedRecord {
            remote_addr: field("remote_addr")?,
            remote_user: field("remote_user")?,
            time_local: field("time_local")?,
            request: field("request")?,
            status: field("status")?,
            body_bytes_sent: field("body_bytes_sent")?,
            http_referer: field("http_referer")?,
            http_user_agent: field("http_user_agent")?,
            http_x_forwarded_for: field("http_x_forwarded_for")?,
            http_x_ab_network_type: field("http_x_ab_network_type")?,
            request_time: field("request_time")?,
            upstream_response_time: field("upstream_response_time")?,
            request_length: field("request_length")?,
            bytes_sent: field("bytes_sent")?,
        })
    }

    /// Looks a field up by its name in [`FIELD_NAMES`].
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "remote_addr" => &self.remote_addr,
            "remote_user" => &self.remote_user,
            "time_local" => &self.time_local,
            "request" => &self.request,
            "status" => &self.status,
            "body_bytes_sent" => &self.body_bytes_sent,
            "http_referer" => &self.http_referer,
            "http_user_agent" => &self.http_user_agent,
            "http_x_forwarded_for" => &self.http_x_forwarded_for,
            "http_x_ab_network_type" => &self.http_x_ab_network_type,
            "request_time" => &self.request_time,
            "upstream_response_time" => &self.upstream_response_time,
            "request_length" => &self.request_length,
            "bytes_sent" => &self.bytes_sent,
            _ => return None,
        };

        Some(value.as_str())
    }

    /// Iterates `(name, value)` pairs in line order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        FIELD_NAMES
            .iter()
            .filter_map(move |&name| self.get(name).map(|value| (name, value)))
    }
}

/// Parser for the access-log layout described in the [module docs](self).
#[derive(Clone, Debug)]
pub struct AccessLogParser {
    regex: Regex,
}

impl AccessLogParser {
    pub fn new() -> Self {
        AccessLogParser {
            regex: ACCESS_LOG_REGEX.clone(),
        }
    }

    /// Parses one line, without its line terminator.
    ///
    /// Returns `None` if the line doesn't follow the layout; malformed lines
    /// are never partially parsed.
    pub fn parse(&self, line: &str) -> Option<ParsedRecord> {
        let caps = self.regex.captures(line)?;

        ParsedRecord::from_captures(&caps)
    }
}

impl Default for AccessLogParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses one line with a shared [`AccessLogParser`].
pub fn parse_line(line: &str) -> Option<ParsedRecord> {
    ACCESS_LOG_REGEX
        .captures(line)
        .and_then(|caps| ParsedRecord::from_captures(&caps))
}
