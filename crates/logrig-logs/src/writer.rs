//! File sink with rotation support

use chrono::{DateTime, Local, NaiveDateTime};
use flate2::write::GzEncoder;
use logrig_core::constants::GZIP_EXTENSION;
use logrig_core::{Compression, LoggerSettings, NamingTemplate, RetentionRule, RotationRule};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::retention;

/// The active log file of one component, rolled over by its rotation rule
pub struct FileSink {
    dir: PathBuf,
    component: String,
    path: PathBuf,
    writer: BufWriter<File>,
    naming: NamingTemplate,
    rule: RotationRule,
    retention: RetentionRule,
    compression: Compression,
    auto_clean: bool,
    current_size: u64,
    /// Start of the period the active file covers; names the rotated file
    period_start: NaiveDateTime,
    next_rotation: Option<NaiveDateTime>,
}

impl FileSink {
    /// Open (or resume) the active file for `logger_name` under `settings`.
    /// `Ok(None)` when the settings have no path.
    pub fn open(settings: &LoggerSettings, logger_name: &str, now: NaiveDateTime) -> io::Result<Option<Self>> {
        let (Some(dir), Some(path)) = (settings.log_dir(), settings.active_file(logger_name)) else {
            return Ok(None);
        };
        fs::create_dir_all(&dir)?;

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let metadata = file.metadata()?;
        let current_size = metadata.len();

        // a resumed file keeps the period it was started in
        let period_start = if current_size > 0 {
            metadata
                .modified()
                .map(|t| DateTime::<Local>::from(t).naive_local())
                .unwrap_or(now)
        } else {
            now
        };
        let rule = settings.rotation.rule;

        debug!("Opened log file: {}", path.display());
        Ok(Some(Self {
            dir,
            component: settings.component(logger_name).to_string(),
            path,
            writer: BufWriter::new(file),
            naming: settings.naming(),
            rule,
            retention: settings.retention,
            compression: settings.compression,
            auto_clean: settings.auto_clean,
            current_size,
            period_start,
            next_rotation: rule.next_trigger(period_start),
        }))
    }

    /// Adopt policy changes that keep the same active file
    pub fn reconfigure(&mut self, settings: &LoggerSettings) {
        self.naming = settings.naming();
        self.retention = settings.retention;
        self.compression = settings.compression;
        self.auto_clean = settings.auto_clean;
        if self.rule != settings.rotation.rule {
            self.rule = settings.rotation.rule;
            self.next_rotation = self.rule.next_trigger(self.period_start);
        }
    }

    /// Append one rendered line, rotating first if a time trigger passed
    /// and afterwards if the size threshold was reached
    pub fn write_line(&mut self, line: &str, now: NaiveDateTime) -> io::Result<()> {
        if self.next_rotation.is_some_and(|at| now >= at) {
            self.rotate(now)?;
        }

        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.current_size += line.len() as u64 + 1;

        if let RotationRule::Size { threshold_bytes } = self.rule {
            if self.current_size >= threshold_bytes {
                self.rotate(now)?;
            }
        }
        Ok(())
    }

    /// Move the active file to its rotated name and start a fresh one.
    /// Returns the final path of the rotated file.
    pub fn rotate(&mut self, now: NaiveDateTime) -> io::Result<PathBuf> {
        debug!("Rotating log file: {}", self.path.display());
        self.writer.flush()?;

        let rotated = self.free_rotated_path();
        fs::rename(&self.path, &rotated)?;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.writer = BufWriter::new(file);
        self.current_size = 0;
        self.period_start = now;
        self.next_rotation = self.rule.next_trigger(now);

        let rotated = match self.compression {
            Compression::Gzip => compress(&rotated)?,
            Compression::None => rotated,
        };

        if self.auto_clean {
            if let Err(e) = self.clean() {
                warn!("Retention cleanup failed in {}: {}", self.dir.display(), e);
            }
        }
        Ok(rotated)
    }

    /// Apply the retention rule to this component's rotated files
    pub fn clean(&self) -> io::Result<Vec<PathBuf>> {
        retention::clean_rotated(&self.dir, &self.component, &self.naming, self.retention)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Get the active file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get current file size
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    pub fn next_rotation(&self) -> Option<NaiveDateTime> {
        self.next_rotation
    }

    /// Rotated name for the current period, suffixed `.1`, `.2`, ... when a
    /// file (plain or compressed) of that name already exists
    fn free_rotated_path(&self) -> PathBuf {
        let base = self.naming.rotated_file(&self.component, self.period_start);
        let taken = |p: &Path| p.exists() || gz_path(p).exists();

        let candidate = self.dir.join(&base);
        if !taken(&candidate) {
            return candidate;
        }
        let (stem, ext) = match base.rfind('.') {
            Some(dot) => (&base[..dot], &base[dot..]),
            None => (base.as_str(), ""),
        };
        (1u32..)
            .map(|n| self.dir.join(format!("{}.{}{}", stem, n, ext)))
            .find(|p| !taken(p))
            .unwrap_or(candidate)
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(GZIP_EXTENSION);
    PathBuf::from(name)
}

/// Gzip `path` to `<path>.gz` and remove the original
fn compress(path: &Path) -> io::Result<PathBuf> {
    let target = gz_path(path);
    let mut source = File::open(path)?;
    let mut encoder = GzEncoder::new(File::create(&target)?, flate2::Compression::fast());
    io::copy(&mut source, &mut encoder)?;
    encoder.finish()?;
    fs::remove_file(path)?;
    Ok(target)
}
