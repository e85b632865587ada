//! Ordered frame sequences and the sources frames are loaded from.
//!
//! A [`Sequence`] is a fixed, ordered list of FITS paths discovered in a
//! directory. By default frames are ordered by path, which assumes the
//! file names sort in acquisition order; nothing checks this. Ordering by a
//! header timestamp is available as [`SequenceOrder::HeaderTimestamp`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::fits_header::read_primary_header;
use crate::fits_io::load_frame;
use crate::frame::Frame;

/// File extensions recognised as FITS (compared case-insensitively)
pub const FITS_EXTENSIONS: [&str; 3] = ["fits", "fit", "fts"];

/// Header key used for timestamp ordering when none is given
pub const DEFAULT_TIMESTAMP_KEY: &str = "DATE-OBS";

/// How discovered files are put in acquisition order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SequenceOrder {
    /// Lexical path order
    #[default]
    Filename,
    /// Order by an ISO-8601 timestamp stored in a primary-header key,
    /// ties broken by path
    HeaderTimestamp { key: String },
}

/// Anything frames can be loaded from by sequence index.
///
/// Implemented by [`Sequence`] (frames decoded from disk on demand), by
/// `Vec<Frame>` (frames already in memory) and by [`FrameCache`].
pub trait FrameSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load the frame at `index`, tagged with that index.
    fn load(&mut self, index: usize) -> Result<Frame>;
}

fn out_of_range(index: usize, len: usize) -> PipelineError {
    PipelineError::InsufficientFrames {
        required: index + 1,
        available: len,
    }
}

impl FrameSource for Vec<Frame> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn load(&mut self, index: usize) -> Result<Frame> {
        self.get(index)
            .map(|f| f.clone().with_index(index))
            .ok_or_else(|| out_of_range(index, Vec::len(self)))
    }
}

/// Ordered list of FITS files from one observing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    paths: Vec<PathBuf>,
}

impl Sequence {
    /// Use `paths` in the order given.
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Find the FITS files in `dir` (and its subdirectories when
    /// `recursive`) and order them.
    ///
    /// # Errors
    /// `PipelineError::Sequence` when the directory cannot be read or, in
    /// timestamp mode, a file lacks a parseable timestamp.
    pub fn discover(dir: &Path, recursive: bool, order: &SequenceOrder) -> Result<Self> {
        if !dir.is_dir() {
            return Err(PipelineError::Sequence(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut paths = Vec::new();
        collect_fits_files(dir, recursive, &mut paths)?;
        paths.sort();

        if let SequenceOrder::HeaderTimestamp { key } = order {
            let mut stamped = paths
                .into_iter()
                .map(|path| header_timestamp(&path, key).map(|t| (t, path)))
                .collect::<Result<Vec<_>>>()?;
            // Stable sort keeps path order for equal timestamps
            stamped.sort_by_key(|(t, _)| *t);
            paths = stamped.into_iter().map(|(_, p)| p).collect();
        }

        info!("Found {} FITS files in {}", paths.len(), dir.display());
        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Index of the frame whose file name is `file_name`.
    pub fn position_of(&self, file_name: &str) -> Result<usize> {
        self.paths
            .iter()
            .position(|p| p.file_name().and_then(|n| n.to_str()) == Some(file_name))
            .ok_or_else(|| {
                PipelineError::Sequence(format!("start frame {file_name} not found in sequence"))
            })
    }
}

impl FrameSource for Sequence {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn load(&mut self, index: usize) -> Result<Frame> {
        let path = self
            .paths
            .get(index)
            .ok_or_else(|| out_of_range(index, self.paths.len()))?;
        Ok(load_frame(path)?.with_index(index))
    }
}

/// Keeps recently loaded frames so overlapping background windows decode
/// each file once.
///
/// Holds at most `capacity` frames and evicts the lowest index first,
/// which suits a window sliding forward through the sequence. Results are
/// identical with or without the cache.
pub struct FrameCache<S> {
    inner: S,
    frames: BTreeMap<usize, Frame>,
    capacity: usize,
}

impl<S: FrameSource> FrameCache<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            frames: BTreeMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Number of frames currently held
    pub fn cached(&self) -> usize {
        self.frames.len()
    }
}

impl<S: FrameSource> FrameSource for FrameCache<S> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn load(&mut self, index: usize) -> Result<Frame> {
        if let Some(frame) = self.frames.get(&index) {
            return Ok(frame.clone());
        }

        let frame = self.inner.load(index)?;
        self.frames.insert(index, frame.clone());
        while self.frames.len() > self.capacity {
            self.frames.pop_first();
        }
        Ok(frame)
    }
}

/// True when the path carries one of the [`FITS_EXTENSIONS`].
pub fn is_fits_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FITS_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
        .unwrap_or(false)
}

fn collect_fits_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        PipelineError::Sequence(format!("cannot read directory {}: {e}", dir.display()))
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| PipelineError::Sequence(format!("cannot list {}: {e}", dir.display())))?
            .path();
        if path.is_dir() {
            if recursive {
                collect_fits_files(&path, recursive, out)?;
            }
        } else if is_fits_path(&path) {
            out.push(path);
        } else {
            debug!("Skipping non-FITS file {}", path.display());
        }
    }
    Ok(())
}

fn header_timestamp(path: &Path, key: &str) -> Result<NaiveDateTime> {
    let header = read_primary_header(path)
        .map_err(|e| PipelineError::Sequence(format!("cannot order by {key}: {e}")))?;
    let value = header.get_string(key).ok_or_else(|| {
        PipelineError::Sequence(format!("{} has no {key} header key", path.display()))
    })?;
    parse_timestamp(&value).ok_or_else(|| {
        PipelineError::Sequence(format!(
            "{}: cannot parse {key} value '{value}' as a timestamp",
            path.display()
        ))
    })
}

/// Parse FITS-style timestamps: `YYYY-MM-DDThh:mm:ss[.fff]` or a bare date.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
