//! Per-line structured record parsing and pretty rendering.
//!
//! Log files written by bunyan-style loggers carry one JSON object per line.
//! Each line is judged independently: a line that parses as a JSON object is
//! rendered in a consistent human-readable layout, anything else passes
//! through byte-identical. Parse failure never becomes an error.

use colored::Colorize;
use serde_json::{Map, Value};

/// Origin of a line within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOrigin {
    Historical,
    Live,
}

/// One raw line read from the log file. Immutable once read.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub text: String,
    pub origin: LineOrigin,
}

impl LogLine {
    pub fn historical(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: LineOrigin::Historical,
        }
    }

    pub fn live(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: LineOrigin::Live,
        }
    }
}

/// Bunyan numeric log levels (10..=60)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Unknown,
}

impl Level {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0..=10) => Level::Trace,
                Some(11..=20) => Level::Debug,
                Some(21..=30) => Level::Info,
                Some(31..=40) => Level::Warn,
                Some(41..=50) => Level::Error,
                Some(51..=60) => Level::Fatal,
                _ => Level::Unknown,
            },
            Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "trace" => Level::Trace,
                "debug" => Level::Debug,
                "info" => Level::Info,
                "warn" | "warning" => Level::Warn,
                "error" => Level::Error,
                "fatal" => Level::Fatal,
                _ => Level::Unknown,
            },
            _ => Level::Unknown,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::Unknown => "LOG",
        }
    }

    fn styled(&self) -> String {
        let name = self.name();
        match self {
            Level::Trace | Level::Debug => name.dimmed().to_string(),
            Level::Info => name.cyan().to_string(),
            Level::Warn => name.yellow().to_string(),
            Level::Error => name.red().to_string(),
            Level::Fatal => name.red().bold().to_string(),
            Level::Unknown => name.normal().to_string(),
        }
    }
}

/// A parsed single-line record. Envelope fields are lifted out; whatever
/// remains is kept as metadata.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub time: Option<String>,
    pub level: Level,
    pub msg: Option<String>,
    pub meta: Map<String, Value>,
}

/// Bunyan envelope fields that are rendered (or deliberately dropped)
/// rather than echoed as metadata.
const ENVELOPE_FIELDS: &[&str] = &["name", "hostname", "pid", "v", "time", "level", "msg"];

impl LogRecord {
    fn from_map(mut map: Map<String, Value>) -> Self {
        let time = map.get("time").and_then(Value::as_str).map(str::to_string);
        let level = Level::from_value(map.get("level"));
        let msg = map
            .get("msg")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string);

        for field in ENVELOPE_FIELDS {
            map.remove(*field);
        }
        map.remove("message");

        Self {
            time,
            level,
            msg,
            meta: map,
        }
    }

    /// Request/response shorthand for http log entries:
    /// `"GET /posts/ 200 12ms"`.
    fn http_summary(&self) -> Option<String> {
        let req = self.meta.get("req")?.as_object()?;
        let method = req.get("method")?.as_str()?;
        let url = req.get("url").or_else(|| req.get("originalUrl"))?.as_str()?;

        let mut summary = format!("\"{} {}\"", method, url);
        if let Some(res) = self.meta.get("res").and_then(Value::as_object) {
            if let Some(status) = res.get("statusCode").and_then(Value::as_u64) {
                summary.push_str(&format!(" {}", status));
            }
            if let Some(ms) = res.get("responseTime").and_then(Value::as_f64) {
                summary.push_str(&format!(" {}ms", ms));
            }
        }
        Some(summary)
    }

    /// Stack trace carried under the bunyan `err` field, if any.
    fn error_stack(&self) -> Option<&str> {
        self.meta.get("err")?.as_object()?.get("stack")?.as_str()
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(time) = &self.time {
            out.push_str(&format!("[{}] ", time.dimmed()));
        }
        out.push_str(&self.styled_level());
        out.push(' ');

        let mut body_written = false;
        if let Some(msg) = &self.msg {
            if !msg.is_empty() {
                out.push_str(msg);
                body_written = true;
            }
        }
        if let Some(http) = self.http_summary() {
            if body_written {
                out.push(' ');
            }
            out.push_str(&http);
            body_written = true;
        }
        if !body_written {
            out.push_str("(no message)");
        }

        let details = self.render_meta();
        if !details.is_empty() {
            out.push(' ');
            out.push_str(&details.dimmed().to_string());
        }

        if let Some(stack) = self.error_stack() {
            out.push('\n');
            out.push_str(&stack.red().to_string());
        }

        out
    }

    fn styled_level(&self) -> String {
        self.level.styled()
    }

    /// Remaining metadata as compact `key=value` pairs. The `req`/`res`/`err`
    /// objects are consumed by the summary/stack rendering and skipped here.
    fn render_meta(&self) -> String {
        let pairs: Vec<String> = self
            .meta
            .iter()
            .filter(|(k, _)| k.as_str() != "req" && k.as_str() != "res" && k.as_str() != "err")
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect();
        pairs.join(" ")
    }
}

/// Result of judging one raw line: a structured record, or raw passthrough.
#[derive(Debug, Clone)]
pub enum FormattedRecord {
    Structured(LogRecord),
    Raw(String),
}

impl FormattedRecord {
    /// Parse one raw line. Never fails: input that is not a JSON object
    /// becomes `Raw`.
    pub fn from_line(line: &str) -> Self {
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => FormattedRecord::Structured(LogRecord::from_map(map)),
            _ => FormattedRecord::Raw(line.to_string()),
        }
    }

    /// Human-readable rendering. `Raw` lines come back unchanged.
    pub fn render(&self) -> String {
        match self {
            FormattedRecord::Structured(record) => record.render(),
            FormattedRecord::Raw(line) => line.clone(),
        }
    }
}
