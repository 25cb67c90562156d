//! Structured JSON logging for tron services.
//!
//! A logger is assembled from [`LoggerOption`]s: outputs (console, size-rotated
//! file, or any `MakeWriter`) and static fields attached to every line. Each
//! leveled call is filtered by severity, encoded once, and written to every
//! output.
//!
//! ```no_run
//! use tron_logger::{Logger, RollingFileConfig, build, field, with_console, with_field, with_file};
//!
//! let logger = build(
//!     "orders",
//!     "info",
//!     vec![
//!         with_console(),
//!         with_file("/var/log/orders", "orders.log", RollingFileConfig::default()),
//!         with_field("app_env", "prod"),
//!     ],
//! )?;
//! logger.info("order placed", &[field("order_id", 42)]);
//! # Ok::<(), tron_logger::LoggerError>(())
//! ```

pub mod encoder;
pub mod error;
pub mod field;
pub mod level;
pub mod logger;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod rolling;
pub mod settings;

#[cfg(test)]
mod testing;

pub use encoder::{EncoderConfig, Entry, JsonEncoder};
pub use error::LoggerError;
pub use field::{Field, FieldValue, field, fields_from_map, with_timestamp};
pub use level::{ParseSeverityError, Severity};
pub use logger::{JsonLogger, Logger, build};
pub use options::{
    Config, LoggerOption, with_console, with_field, with_fields, with_file, with_outputs,
    with_stacktrace_at,
};
pub use output::{FileOutput, OutputConfig, RollingFileConfig};
pub use pipeline::{Core, FanOut, Sink, build_core};
pub use rolling::RollingFile;
pub use settings::build_from_settings;
