//! Build a logger from deployment settings.
//!
//! Keys read: `logging.path`, `logging.maxSize`, `logging.maxBackups`,
//! `logging.maxAge`, `logging.compress`, `logging.console`,
//! `application.name`, `application.env`, `cluster.namespace`,
//! `cluster.nodeName`, `cluster.podName`.

use tron_config::ConfigSource;

use crate::error::LoggerError;
use crate::field::Field;
use crate::logger::{JsonLogger, build};
use crate::options::{LoggerOption, with_console, with_fields, with_file};
use crate::output::RollingFileConfig;

/// Rotation limits under `logging.*`. Negative values count as zero.
pub fn rolling_from_settings(source: &impl ConfigSource) -> RollingFileConfig {
    let non_negative = |key: &str| source.get_int(key).max(0);
    RollingFileConfig {
        max_size_mb: non_negative("logging.maxSize") as u64,
        max_backups: u32::try_from(non_negative("logging.maxBackups")).unwrap_or(u32::MAX),
        max_age_days: u32::try_from(non_negative("logging.maxAge")).unwrap_or(u32::MAX),
        compress: source.get_bool("logging.compress"),
    }
}

/// Like [`build`], after appending a `<name>.log` file under `logging.path`,
/// a console output if `logging.console` is set, and the application and
/// cluster identity fields.
pub fn build_from_settings(
    source: &impl ConfigSource,
    name: &str,
    level: &str,
    opts: impl IntoIterator<Item = LoggerOption>,
) -> Result<JsonLogger, LoggerError> {
    let name = name.to_lowercase();
    let mut opts: Vec<LoggerOption> = opts.into_iter().collect();

    opts.push(with_file(
        source.get_string("logging.path"),
        &format!("{name}.log"),
        rolling_from_settings(source),
    ));
    if source.get_bool("logging.console") {
        opts.push(with_console());
    }

    opts.push(with_fields(vec![
        Field::new("app_name", source.get_string("application.name").to_lowercase()),
        Field::new("app_env", source.get_string("application.env").to_lowercase()),
    ]));
    if !source.get_string("cluster.namespace").is_empty() {
        opts.push(with_fields(vec![
            Field::new("namespace", source.get_string("cluster.namespace")),
            Field::new("node_name", source.get_string("cluster.nodeName")),
            Field::new("pod_name", source.get_string("cluster.podName")),
        ]));
    }

    build(&name, level, opts)
}
