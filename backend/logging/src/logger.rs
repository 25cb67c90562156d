//! The logger facade handed to application code.

use std::backtrace::Backtrace;
use std::panic::Location;

use tracing::debug;

use crate::encoder::Entry;
use crate::error::LoggerError;
use crate::field::{Field, FieldValue, with_timestamp};
use crate::level::Severity;
use crate::options::{Config, LoggerOption};
use crate::output::OutputConfig;
use crate::pipeline::{Core, Sink, build_core};

/// Static field carrying the (lowercased) logger name on every line.
pub const LOGGER_NAME_KEY: &str = "logger_name";

/// Exit code used after a fatal line is written.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Leveled structured logging.
///
/// Every call merges the logger's static fields with `fields` and a fresh
/// `time` (unless one is supplied) and writes one line to each sink.
pub trait Logger: Send + Sync {
    /// The minimum severity exactly as it was configured.
    fn level(&self) -> &str;

    fn field(&self, key: &str, value: FieldValue) -> Field {
        Field::new(key, value)
    }

    #[track_caller]
    fn debug(&self, msg: &str, fields: &[Field]);
    #[track_caller]
    fn info(&self, msg: &str, fields: &[Field]);
    #[track_caller]
    fn warn(&self, msg: &str, fields: &[Field]);
    #[track_caller]
    fn error(&self, msg: &str, fields: &[Field]);

    /// Writes the line, then terminates the process with [`FATAL_EXIT_CODE`].
    #[track_caller]
    fn fatal(&self, msg: &str, fields: &[Field]) -> !;
}

/// JSON logger over a fan-out [`Core`].
pub struct JsonLogger {
    name: String,
    level: String,
    stack_level: Severity,
    core: Core,
    fields: Vec<Field>,
}

impl JsonLogger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn static_fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn sinks(&self) -> &[Sink] {
        self.core.sinks()
    }

    fn log(&self, severity: Severity, msg: &str, fields: &[Field], caller: &Location<'_>) {
        if !self.core.enabled(severity) {
            return;
        }

        let fields = with_timestamp(fields);
        let entry = Entry {
            severity,
            logger_name: &self.name,
            caller: Some(format!("{}:{}", caller.file(), caller.line())),
            message: msg,
            stack: (severity >= self.stack_level).then(|| Backtrace::force_capture().to_string()),
        };
        self.core.write(&entry, &self.fields, &fields);
    }
}

impl Logger for JsonLogger {
    fn level(&self) -> &str {
        &self.level
    }

    #[track_caller]
    fn debug(&self, msg: &str, fields: &[Field]) {
        self.log(Severity::Debug, msg, fields, Location::caller());
    }

    #[track_caller]
    fn info(&self, msg: &str, fields: &[Field]) {
        self.log(Severity::Info, msg, fields, Location::caller());
    }

    #[track_caller]
    fn warn(&self, msg: &str, fields: &[Field]) {
        self.log(Severity::Warn, msg, fields, Location::caller());
    }

    #[track_caller]
    fn error(&self, msg: &str, fields: &[Field]) {
        self.log(Severity::Error, msg, fields, Location::caller());
    }

    #[track_caller]
    fn fatal(&self, msg: &str, fields: &[Field]) -> ! {
        self.log(Severity::Fatal, msg, fields, Location::caller());
        std::process::exit(FATAL_EXIT_CODE)
    }
}

/// Build a logger named `name` that drops lines below `level`.
///
/// With no output options the logger writes to stdout. Fails if a file
/// output cannot be opened.
pub fn build(
    name: &str,
    level: &str,
    opts: impl IntoIterator<Item = LoggerOption>,
) -> Result<JsonLogger, LoggerError> {
    let mut config = Config::from_options(opts);
    if config.outputs.is_empty() {
        config.outputs.push(OutputConfig::console());
    }

    let stack_level = config.stack_level();
    let core = build_core(level, config.outputs)?;

    let name = name.to_lowercase();
    let mut fields = config.fields;
    fields.push(Field::new(LOGGER_NAME_KEY, name.as_str()));

    debug!(logger = %name, level = %level, sinks = core.sinks().len(), "Built logger");
    Ok(JsonLogger {
        name,
        level: level.to_string(),
        stack_level,
        core,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{TIME_KEY, field};
    use crate::options::{with_console, with_field, with_file, with_outputs, with_stacktrace_at};
    use crate::output::RollingFileConfig;
    use crate::testing::Capture;
    use serde_json::Value;

    fn captured(name: &str, level: &str, mut opts: Vec<LoggerOption>) -> (JsonLogger, Capture) {
        let capture = Capture::default();
        opts.push(with_outputs(vec![OutputConfig::writer("mem", capture.clone())]));
        (build(name, level, opts).unwrap(), capture)
    }

    fn only_line(capture: &Capture) -> Value {
        let lines = capture.lines();
        assert_eq!(lines.len(), 1, "{lines:?}");
        serde_json::from_str(&lines[0]).unwrap()
    }

    #[test]
    fn defaults_to_one_console_sink() {
        let logger = build("svc", "info", Vec::new()).unwrap();
        let labels: Vec<_> = logger.sinks().iter().map(Sink::label).collect();
        assert_eq!(labels, vec!["console"]);
    }

    #[test]
    fn level_is_reported_verbatim() {
        let (logger, _) = captured("svc", "WARN", Vec::new());
        assert_eq!(logger.level(), "WARN");
        let (logger, _) = captured("svc", "bogus", Vec::new());
        assert_eq!(logger.level(), "bogus");
    }

    #[test]
    fn appends_lowercased_logger_name() {
        let (logger, capture) = captured("Billing", "info", vec![with_field("app_env", "prod")]);
        assert_eq!(
            logger.static_fields(),
            &[field("app_env", "prod"), field(LOGGER_NAME_KEY, "billing")]
        );

        logger.info("hello", &[field("k", "v")]);
        let line = only_line(&capture);
        assert_eq!(line["level"], "info");
        assert_eq!(line["message"], "hello");
        assert_eq!(line["logger"], "billing");
        assert_eq!(line[LOGGER_NAME_KEY], "billing");
        assert_eq!(line["app_env"], "prod");
        assert_eq!(line["k"], "v");
        assert!(line[TIME_KEY].is_string());
    }

    #[test]
    fn warn_threshold_drops_debug_and_info() {
        let (logger, capture) = captured("svc", "warn", Vec::new());
        logger.debug("d", &[]);
        logger.info("i", &[]);
        assert!(capture.contents().is_empty());

        logger.warn("w", &[]);
        logger.error("e", &[]);
        let levels: Vec<Value> = capture
            .lines()
            .iter()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["level"].clone())
            .collect();
        assert_eq!(levels, vec!["warn", "error"]);
    }

    #[test]
    fn records_call_site() {
        let (logger, capture) = captured("svc", "info", Vec::new());
        logger.info("here", &[]);
        let line = only_line(&capture);
        let caller = line["caller"].as_str().unwrap();
        assert!(caller.contains("logger.rs:"), "{caller}");
    }

    #[test]
    fn stack_only_at_or_above_threshold() {
        let (logger, capture) = captured("svc", "debug", vec![with_stacktrace_at(Severity::Warn)]);
        logger.info("no stack", &[]);
        logger.warn("stack", &[]);
        let lines: Vec<Value> = capture
            .lines()
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert!(lines[0].get("stack").is_none());
        assert!(lines[1]["stack"].is_string());
    }

    #[test]
    fn nil_fields_never_written() {
        let (logger, capture) = captured("svc", "info", vec![with_field("static_nil", None::<String>)]);
        logger.info("m", &[field("call_nil", FieldValue::Nil), logger.field("ok", true.into())]);
        let text = capture.contents();
        assert!(!text.contains("_nil"));
        assert!(text.contains(r#""ok":true"#));
    }

    #[test]
    fn duplicate_keys_are_both_written() {
        let (logger, capture) = captured("svc", "info", vec![with_field("region", "eu")]);
        logger.info("m", &[field("region", "us")]);
        let text = capture.contents();
        assert!(text.contains(r#""region":"eu""#));
        assert!(text.contains(r#""region":"us""#));
    }

    #[test]
    fn caller_time_is_kept() {
        let (logger, capture) = captured("svc", "info", Vec::new());
        let t = chrono::DateTime::parse_from_rfc3339("2020-05-06T07:08:09Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        logger.info("m", &[field(TIME_KEY, t)]);
        assert_eq!(capture.contents().matches(r#""time":"#).count(), 1);
        assert_eq!(only_line(&capture)[TIME_KEY], "2020-05-06T07:08:09.000Z");
    }

    #[test]
    fn file_and_writer_sinks_see_identical_lines() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, capture) = captured(
            "svc",
            "info",
            vec![with_file(dir.path().to_string_lossy(), "svc.log", RollingFileConfig::default())],
        );
        assert_eq!(logger.sinks().len(), 2);

        logger.info("hello", &[field("k", "v")]);
        let from_file = std::fs::read_to_string(dir.path().join("svc.log")).unwrap();
        assert_eq!(from_file, capture.contents());
    }

    #[test]
    fn console_and_file_build_together() {
        let dir = tempfile::tempdir().unwrap();
        let logger = build(
            "svc",
            "info",
            vec![
                with_console(),
                with_file(dir.path().to_string_lossy(), "svc.log", RollingFileConfig::default()),
            ],
        )
        .unwrap();
        let labels: Vec<_> = logger.sinks().iter().map(Sink::label).collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], "console");
    }

    #[test]
    fn logger_is_usable_as_trait_object() {
        let (logger, capture) = captured("svc", "info", Vec::new());
        let shared: std::sync::Arc<dyn Logger> = std::sync::Arc::new(logger);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || shared.info("worker", &[field("id", i)]))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(capture.lines().len(), 4);
    }
}
