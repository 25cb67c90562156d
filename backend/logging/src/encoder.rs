//! One-object-per-line JSON encoding.
//!
//! Objects are written key by key rather than through a map, so repeated keys
//! survive and field order is kept.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::field::{Field, FieldValue};
use crate::level::Severity;

/// Key names and line ending for encoded entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub level_key: &'static str,
    pub name_key: &'static str,
    pub caller_key: &'static str,
    pub message_key: &'static str,
    pub stacktrace_key: &'static str,
    pub line_ending: &'static str,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            level_key: "level",
            name_key: "logger",
            caller_key: "caller",
            message_key: "message",
            stacktrace_key: "stack",
            line_ending: "\n",
        }
    }
}

/// The fixed part of a log line.
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    pub severity: Severity,
    pub logger_name: &'a str,
    pub caller: Option<String>,
    pub message: &'a str,
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    config: EncoderConfig,
}

impl JsonEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Encode one line: entry keys, then `static_fields`, then `fields`.
    pub fn encode(&self, entry: &Entry<'_>, static_fields: &[Field], fields: &[Field]) -> Vec<u8> {
        let mut line = ObjectWriter::new();
        let cfg = &self.config;

        line.key(cfg.level_key);
        line.json(entry.severity.as_str());
        if !entry.logger_name.is_empty() {
            line.key(cfg.name_key);
            line.json(entry.logger_name);
        }
        if let Some(caller) = &entry.caller {
            line.key(cfg.caller_key);
            line.json(caller);
        }
        line.key(cfg.message_key);
        line.json(entry.message);
        if let Some(stack) = &entry.stack {
            line.key(cfg.stacktrace_key);
            line.json(stack);
        }

        for field in static_fields.iter().chain(fields) {
            if field.value.is_nil() {
                continue;
            }
            line.key(&field.key);
            line.value(&field.value);
        }

        line.finish(cfg.line_ending)
    }
}

struct ObjectWriter {
    buf: Vec<u8>,
    empty: bool,
}

impl ObjectWriter {
    fn new() -> Self {
        Self {
            buf: vec![b'{'],
            empty: true,
        }
    }

    fn key(&mut self, key: &str) {
        if !self.empty {
            self.buf.push(b',');
        }
        self.empty = false;
        self.json(key);
        self.buf.push(b':');
    }

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) {
        let mark = self.buf.len();
        if serde_json::to_writer(&mut self.buf, value).is_err() {
            self.buf.truncate(mark);
            self.buf.extend_from_slice(b"null");
        }
    }

    fn value(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Nil => self.buf.extend_from_slice(b"null"),
            FieldValue::Str(s) | FieldValue::Error(s) | FieldValue::Opaque(s) => self.json(s),
            FieldValue::Int(i) => {
                let _ = write!(self.buf, "{i}");
            }
            FieldValue::Uint(u) => {
                let _ = write!(self.buf, "{u}");
            }
            FieldValue::Float(f) => self.float(*f),
            FieldValue::Bool(b) => self.json(b),
            FieldValue::Bytes(bytes) => self.json(&*String::from_utf8_lossy(bytes)),
            FieldValue::Time(t) => self.json(&format_time(t)),
            FieldValue::Duration(d) => self.float(d.as_secs_f64()),
            FieldValue::Json(v) => self.json(v),
        }
    }

    fn float(&mut self, f: f64) {
        if f.is_nan() {
            self.json("NaN");
        } else if f.is_infinite() {
            self.json(if f > 0.0 { "+Inf" } else { "-Inf" });
        } else {
            self.json(&f);
        }
    }

    fn finish(mut self, line_ending: &str) -> Vec<u8> {
        self.buf.push(b'}');
        self.buf.extend_from_slice(line_ending.as_bytes());
        self.buf
    }
}

/// ISO-8601 in UTC with millisecond precision.
pub fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}
