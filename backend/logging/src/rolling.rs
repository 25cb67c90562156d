//! Size-rotated log file.
//!
//! The active file is renamed to `<stem>-<UTC timestamp>.<ext>` once the next
//! write would push it over the size limit. After each rotation, backups are
//! pruned by count and age and, optionally, gzipped.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, warn};

use crate::error::LoggerError;
use crate::output::RollingFileConfig;

const MEGABYTE: u64 = 1024 * 1024;
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const GZ_SUFFIX: &str = ".gz";

pub struct RollingFile {
    path: PathBuf,
    max_size: u64,
    max_backups: usize,
    max_age: Option<TimeDelta>,
    compress: bool,
    active: Mutex<ActiveFile>,
}

struct ActiveFile {
    file: File,
    size: u64,
    last_backup: Option<DateTime<Utc>>,
}

struct Backup {
    path: PathBuf,
    time: DateTime<Utc>,
    compressed: bool,
}

impl RollingFile {
    /// Open (or create) the file at `path`, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, config: &RollingFileConfig) -> Result<Self, LoggerError> {
        let max_size_mb = match config.max_size_mb {
            0 => DEFAULT_MAX_SIZE_MB,
            mb => mb,
        };
        Self::with_limit(path.into(), max_size_mb.saturating_mul(MEGABYTE), config)
    }

    fn with_limit(path: PathBuf, max_size: u64, config: &RollingFileConfig) -> Result<Self, LoggerError> {
        if path.file_name().is_none() {
            return Err(LoggerError::InvalidOutput {
                sink: "file",
                reason: format!("path {} does not name a file", path.display()),
            });
        }

        let file = open_append(&path).map_err(|source| LoggerError::OpenFile {
            path: path.clone(),
            source,
        })?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            path,
            max_size,
            max_backups: config.max_backups as usize,
            max_age: (config.max_age_days > 0).then(|| TimeDelta::days(i64::from(config.max_age_days))),
            compress: config.compress,
            active: Mutex::new(ActiveFile {
                file,
                size,
                last_backup: None,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_entry(&self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        if len > self.max_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("write of {len} bytes exceeds max file size {}", self.max_size),
            ));
        }

        let mut active = self
            .active
            .lock()
            .map_err(|_| io::Error::other("rolling file lock poisoned"))?;

        if active.size + len > self.max_size {
            self.rotate(&mut active)?;
        }

        active.file.write_all(buf)?;
        active.size += len;
        Ok(buf.len())
    }

    fn rotate(&self, active: &mut ActiveFile) -> io::Result<()> {
        active.file.flush()?;

        // Backups are ordered by the timestamp in their name, so keep it strictly increasing.
        let mut stamp = Utc::now();
        if let Some(last) = active.last_backup {
            if stamp <= last {
                stamp = last + TimeDelta::milliseconds(1);
            }
        }

        let backup = self.backup_path(stamp);
        let renamed = match fs::rename(&self.path, &backup) {
            Ok(()) => Ok(true),
            // Removed or moved away externally: start a fresh file.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        };

        // Reopen even when the rename failed.
        active.file = open_append(&self.path)?;
        active.size = active.file.metadata().map(|m| m.len()).unwrap_or(0);
        if !renamed? {
            debug!(path = %self.path.display(), "Log file missing at rotation, reopened");
            return Ok(());
        }

        active.last_backup = Some(stamp);
        debug!(path = %self.path.display(), backup = %backup.display(), "Rotated log file");

        self.prune();
        Ok(())
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// `app.log` -> (`app-`, `.log`)
    fn name_parts(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (format!("{stem}-"), ext)
    }

    fn backup_path(&self, at: DateTime<Utc>) -> PathBuf {
        let (prefix, ext) = self.name_parts();
        self.dir()
            .join(format!("{prefix}{}{ext}", at.format(BACKUP_TIME_FORMAT)))
    }

    fn list_backups(&self) -> io::Result<Vec<Backup>> {
        let (prefix, ext) = self.name_parts();
        let gz_ext = format!("{ext}{GZ_SUFFIX}");
        let mut backups = Vec::new();

        for entry in fs::read_dir(self.dir())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };
            let (stamp, compressed) = match rest.strip_suffix(&gz_ext) {
                Some(stamp) => (stamp, true),
                None => match rest.strip_suffix(&ext) {
                    Some(stamp) => (stamp, false),
                    None => continue,
                },
            };
            if let Ok(time) = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT) {
                backups.push(Backup {
                    path: entry.path(),
                    time: time.and_utc(),
                    compressed,
                });
            }
        }

        backups.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(backups)
    }

    fn prune(&self) {
        let backups = match self.list_backups() {
            Ok(b) => b,
            Err(e) => {
                warn!(dir = %self.dir().display(), error = %e, "Failed to list log backups");
                return;
            }
        };

        // An age past chrono's range means nothing can be old enough.
        let cutoff = self.max_age.and_then(|age| Utc::now().checked_sub_signed(age));
        for (i, backup) in backups.into_iter().enumerate() {
            let over_count = self.max_backups > 0 && i >= self.max_backups;
            let expired = cutoff.is_some_and(|c| backup.time < c);

            if over_count || expired {
                if let Err(e) = fs::remove_file(&backup.path) {
                    warn!("Failed to remove log backup {}: {}", backup.path.display(), e);
                }
            } else if self.compress && !backup.compressed {
                if let Err(e) = compress_file(&backup.path) {
                    warn!("Failed to compress log backup {}: {}", backup.path.display(), e);
                }
            }
        }
    }
}

impl Write for &RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_entry(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.active
            .lock()
            .map_err(|_| io::Error::other("rolling file lock poisoned"))?
            .file
            .flush()
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_entry(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut this: &RollingFile = self;
        this.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn compress_file(src: &Path) -> io::Result<()> {
    let mut dst_name = src.as_os_str().to_owned();
    dst_name.push(GZ_SUFFIX);
    let dst = PathBuf::from(dst_name);

    let result = (|| -> io::Result<()> {
        let mut input = File::open(src)?;
        let mut encoder = GzEncoder::new(File::create(&dst)?, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.sync_all()
    })();

    match result {
        Ok(()) => fs::remove_file(src),
        Err(e) => {
            let _ = fs::remove_file(&dst);
            Err(e)
        }
    }
}
