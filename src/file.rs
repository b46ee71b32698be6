//! File handles: a path bound to the modification time and readability
//! captured when the handle was created.
//!
//! Every source, template, settings file and output the engine reasons about
//! is a [`FileHandle`]. Handles are stat'd exactly once, at construction, so a
//! staleness decision always compares snapshots taken at a single point and
//! never re-reads the filesystem halfway through.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Modification time as a `(seconds, nanoseconds)` pair.
///
/// Field order matters: the derived ordering compares seconds first and only
/// falls back to the sub-second part when the seconds are equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mtime {
    pub secs: i64,
    pub nanos: u32,
}

impl Mtime {
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            // Pre-epoch timestamps: step back one second and borrow nanos.
            Err(e) => {
                let d = e.duration();
                match d.subsec_nanos() {
                    0 => Self::new(-(d.as_secs() as i64), 0),
                    n => Self::new(-(d.as_secs() as i64) - 1, 1_000_000_000 - n),
                }
            }
        }
    }
}

/// Immutable descriptor of a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Absolute path.
    pub path: PathBuf,
    /// Path relative to the project root, used in logs and to derive the
    /// output paths of copied files.
    pub short_path: String,
    /// Identifier of the document for single-document rules.
    pub slug: Option<String>,
    pub mtime: Mtime,
    /// False when the stat failed.
    pub readable: bool,
}

impl FileHandle {
    /// Stat `path` (resolved against `root` when relative) and capture the
    /// result.
    pub fn stat(root: &Path, path: impl AsRef<Path>, slug: Option<String>) -> Self {
        let given = path.as_ref();
        let path = root.join(given);
        let short_path = match path.strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => given.to_string_lossy().into_owned(),
        };
        let (mtime, readable) = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(time) => (Mtime::from_system_time(time), true),
            Err(_) => (Mtime::default(), false),
        };
        Self {
            path,
            short_path,
            slug,
            mtime,
            readable,
        }
    }

    /// Build a handle from already-known stat results.
    pub fn with_mtime(path: impl Into<PathBuf>, mtime: Mtime) -> Self {
        let path = path.into();
        Self {
            short_path: path.to_string_lossy().into_owned(),
            path,
            slug: None,
            mtime,
            readable: true,
        }
    }

    /// A handle for a path whose stat failed.
    pub fn unreadable(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            short_path: path.to_string_lossy().into_owned(),
            path,
            slug: None,
            mtime: Mtime::default(),
            readable: false,
        }
    }

    pub fn slug(&self) -> &str {
        self.slug.as_deref().unwrap_or_default()
    }
}
