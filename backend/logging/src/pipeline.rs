//! Core assembly: resolve outputs into sinks, filter by severity, encode once, fan out.

use std::io::Write;
use std::sync::Arc;

use tracing::debug;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::encoder::{EncoderConfig, Entry, JsonEncoder};
use crate::error::LoggerError;
use crate::field::Field;
use crate::level::Severity;
use crate::output::OutputConfig;
use crate::rolling::RollingFile;

/// A resolved destination for encoded lines.
pub struct Sink {
    label: String,
    writer: BoxMakeWriter,
}

impl Sink {
    pub fn new<M>(label: impl Into<String>, make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            writer: BoxMakeWriter::new(make_writer),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn write_line(&self, line: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.make_writer();
        writer.write_all(line)?;
        writer.flush()
    }
}

/// Delivers every line to each sink independently.
pub struct FanOut {
    sinks: Vec<Sink>,
}

impl FanOut {
    pub fn new(sinks: Vec<Sink>) -> Self {
        Self { sinks }
    }

    pub fn sinks(&self) -> &[Sink] {
        &self.sinks
    }

    /// Best effort: a failing sink does not stop the others, and errors are dropped.
    pub fn write_line(&self, line: &[u8]) {
        for sink in &self.sinks {
            let _ = sink.write_line(line);
        }
    }
}

/// Severity filter + shared encoder + fan-out.
pub struct Core {
    level: Severity,
    encoder: JsonEncoder,
    out: FanOut,
}

impl Core {
    pub fn new(level: Severity, encoder: JsonEncoder, out: FanOut) -> Self {
        Self { level, encoder, out }
    }

    pub fn level(&self) -> Severity {
        self.level
    }

    pub fn sinks(&self) -> &[Sink] {
        self.out.sinks()
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.level
    }

    /// Encode once and hand the same bytes to every sink. Filtered lines cost nothing.
    pub fn write(&self, entry: &Entry<'_>, static_fields: &[Field], fields: &[Field]) {
        if !self.enabled(entry.severity) {
            return;
        }
        let line = self.encoder.encode(entry, static_fields, fields);
        self.out.write_line(&line);
    }
}

/// Resolve `outputs` into sinks behind a `level` filter and the default JSON encoder.
///
/// No default output is injected here; an empty list builds a core that writes nowhere.
pub fn build_core(level: &str, outputs: Vec<OutputConfig>) -> Result<Core, LoggerError> {
    let sinks = outputs
        .into_iter()
        .map(resolve)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Core::new(
        Severity::parse_lenient(level),
        JsonEncoder::new(EncoderConfig::default()),
        FanOut::new(sinks),
    ))
}

fn resolve(output: OutputConfig) -> Result<Sink, LoggerError> {
    let label = output.label();
    let sink = match output {
        OutputConfig::Console => Sink::new(label, std::io::stdout),
        OutputConfig::File(file) => {
            if file.path.is_empty() {
                return Err(LoggerError::InvalidOutput {
                    sink: "file",
                    reason: "empty path".to_string(),
                });
            }
            let rolling = RollingFile::open(&file.path, &file.rolling)?;
            Sink::new(label, Arc::new(rolling))
        }
        OutputConfig::Writer(custom) => Sink {
            label,
            writer: custom.writer,
        },
    };
    debug!(sink = %sink.label, "Resolved log sink");
    Ok(sink)
}
