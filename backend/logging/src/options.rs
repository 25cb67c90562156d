//! Logger options, applied in order to an empty [`Config`].

use crate::field::{Field, FieldValue};
use crate::level::Severity;
use crate::output::{OutputConfig, RollingFileConfig};

/// Severity at which a stack trace is attached when none is configured.
pub const DEFAULT_STACK_LEVEL: Severity = Severity::Error;

/// Everything the options accumulated.
#[derive(Debug, Default)]
pub struct Config {
    pub outputs: Vec<OutputConfig>,
    pub fields: Vec<Field>,
    pub stack_level: Option<Severity>,
}

impl Config {
    pub fn from_options(opts: impl IntoIterator<Item = LoggerOption>) -> Self {
        let mut config = Config::default();
        for apply in opts {
            apply(&mut config);
        }
        config
    }

    pub fn stack_level(&self) -> Severity {
        self.stack_level.unwrap_or(DEFAULT_STACK_LEVEL)
    }
}

/// A single configuration step. Options only append, so they compose in any grouping.
pub type LoggerOption = Box<dyn FnOnce(&mut Config) + Send>;

pub fn with_console() -> LoggerOption {
    Box::new(|c| c.outputs.push(OutputConfig::console()))
}

pub fn with_file(dir: impl Into<String>, file_name: &str, rolling: RollingFileConfig) -> LoggerOption {
    let output = OutputConfig::file(dir, file_name, rolling);
    Box::new(move |c| c.outputs.push(output))
}

pub fn with_outputs(outputs: Vec<OutputConfig>) -> LoggerOption {
    Box::new(move |c| c.outputs.extend(outputs))
}

pub fn with_fields(fields: Vec<Field>) -> LoggerOption {
    Box::new(move |c| c.fields.extend(fields))
}

pub fn with_field(key: impl Into<String>, value: impl Into<FieldValue>) -> LoggerOption {
    let field = Field::new(key, value);
    Box::new(move |c| c.fields.push(field))
}

/// Attach a stack trace to lines at or above `level`.
pub fn with_stacktrace_at(level: Severity) -> LoggerOption {
    Box::new(move |c| c.stack_level = Some(level))
}
