//! Persisting captured frames as still images

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

use chrono::{Local, NaiveDateTime};

use crate::{
    encoder::{encoder_for, EncoderStats, StillFormat},
    error::{SaveError, SaveResult},
    types::Frame,
};

/// Prefix of names synthesised for unnamed snapshots
pub const DEFAULT_NAME_PREFIX: &str = "capture_";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const KNOWN_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Writes snapshots into an output directory
///
/// The directory must already exist; the store never creates it.
#[derive(Debug)]
pub struct SnapshotStore {
    output_dir: PathBuf,
    jpeg_quality: u8,
    stats: EncoderStats,
}

impl SnapshotStore {
    pub fn new(output_dir: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
        Self {
            output_dir: output_dir.into(),
            jpeg_quality,
            stats: EncoderStats::default(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_dir = dir.into();
        log::debug!("Snapshot directory set to {}", self.output_dir.display());
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn stats(&self) -> &EncoderStats {
        &self.stats
    }

    /// File name a request resolves to at wall-clock time `now`
    ///
    /// Only the final path component of the request is used, so a save
    /// always lands directly in the target directory. A blank name becomes
    /// `capture_YYYYMMDD_HHMMSS`. Names that do not end in `.jpg`, `.jpeg` or
    /// `.png` (any case) get `.jpg` appended.
    pub fn resolve_filename(requested_name: &str, now: NaiveDateTime) -> String {
        let name = Path::new(requested_name.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::trim)
            .unwrap_or_default();
        let mut name = if name.is_empty() {
            format!("{}{}", DEFAULT_NAME_PREFIX, now.format(TIMESTAMP_FORMAT))
        } else {
            name.to_string()
        };

        let lower = name.to_ascii_lowercase();
        if !KNOWN_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            name.push('.');
            name.push_str(StillFormat::Jpeg.default_extension());
        }
        name
    }

    /// Save into the configured output directory
    pub fn save(&mut self, frame: &Frame, requested_name: &str) -> SaveResult<PathBuf> {
        let dir = self.output_dir.clone();
        self.save_in(frame, requested_name, &dir)
    }

    /// Save into `dir`
    pub fn save_in(
        &mut self,
        frame: &Frame,
        requested_name: &str,
        dir: &Path,
    ) -> SaveResult<PathBuf> {
        self.save_at(frame, requested_name, dir, Local::now().naive_local())
    }

    /// Save as if the wall clock read `now`
    pub fn save_at(
        &mut self,
        frame: &Frame,
        requested_name: &str,
        dir: &Path,
        now: NaiveDateTime,
    ) -> SaveResult<PathBuf> {
        let path = dir.join(Self::resolve_filename(requested_name, now));
        let format = StillFormat::for_path(&path);
        let encoder = encoder_for(format, self.jpeg_quality);

        let started = Instant::now();
        let encoded = encoder.encode(frame).map_err(|e| SaveError::Encode {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let encode_ms = started.elapsed().as_secs_f64() * 1000.0;

        if let Err(source) = write_file(&path, &encoded) {
            log::warn!("Failed to write {}: {}", path.display(), source);
            return Err(SaveError::Io { path, source });
        }

        self.stats.update(frame.data.len(), encoded.len(), encode_ms);
        log::info!(
            "Saved {}x{} {} snapshot to {} ({} bytes)",
            frame.width,
            frame.height,
            encoder.name(),
            path.display(),
            encoded.len()
        );
        Ok(path)
    }
}

fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    let written = file.write_all(data).and_then(|_| file.sync_all());
    if written.is_err() {
        drop(file);
        // Leave nothing half-written behind
        let _ = fs::remove_file(path);
    }
    written
}
