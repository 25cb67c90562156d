use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a logger. Writes never fail loudly.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("file output: cannot open {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid {sink} output: {reason}")]
    InvalidOutput { sink: &'static str, reason: String },
}
