//! Output descriptors: where encoded lines go.

use std::fmt;
use std::path::MAIN_SEPARATOR;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Rotation limits for a file output. Zero means "use the sink default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingFileConfig {
    /// Megabytes per file before it is rotated.
    #[serde(default, rename = "maxSize")]
    pub max_size_mb: u64,
    /// Rotated files to keep.
    #[serde(default)]
    pub max_backups: u32,
    /// Days to keep rotated files.
    #[serde(default, rename = "maxAge")]
    pub max_age_days: u32,
    /// Gzip rotated files.
    #[serde(default)]
    pub compress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutput {
    pub path: String,
    pub rolling: RollingFileConfig,
}

/// A caller-provided sink, for destinations the built-in outputs don't cover.
pub struct WriterOutput {
    pub name: String,
    pub(crate) writer: BoxMakeWriter,
}

impl fmt::Debug for WriterOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterOutput")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One sink a logger writes to.
#[derive(Debug)]
pub enum OutputConfig {
    Console,
    File(FileOutput),
    Writer(WriterOutput),
}

impl OutputConfig {
    pub fn console() -> Self {
        OutputConfig::Console
    }

    /// A rotating file at `dir` + `file_name`. A separator is inserted when
    /// `dir` lacks a trailing one; an empty `dir` means the working directory.
    pub fn file(dir: impl Into<String>, file_name: &str, rolling: RollingFileConfig) -> Self {
        let mut path = dir.into();
        if !path.is_empty() && !path.ends_with(['/', MAIN_SEPARATOR]) {
            path.push(MAIN_SEPARATOR);
        }
        path.push_str(file_name);
        OutputConfig::File(FileOutput { path, rolling })
    }

    pub fn writer<M>(name: impl Into<String>, make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        OutputConfig::Writer(WriterOutput {
            name: name.into(),
            writer: BoxMakeWriter::new(make_writer),
        })
    }

    /// Short label used in diagnostics.
    pub fn label(&self) -> String {
        match self {
            OutputConfig::Console => "console".to_string(),
            OutputConfig::File(file) => format!("file:{}", file.path),
            OutputConfig::Writer(w) => format!("writer:{}", w.name),
        }
    }
}
