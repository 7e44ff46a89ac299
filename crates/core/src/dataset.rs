//! Reading and writing the games data file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::Entry;

/// Timestamp layout embedded in backup file names.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static BACKUP_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+)_backup_(\d{8}_\d{6})(?:_(\d+))?\.json$").expect("invalid backup name regex")
});

/// Failure to read the data file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not a JSON array of game objects.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while writing the data file or its backup.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Copying the previous file into the backup directory failed.
    #[error("failed to back up {} to {}: {source}", path.display(), backup.display())]
    Backup {
        /// File being backed up.
        path: PathBuf,
        /// Backup destination.
        backup: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The entries could not be encoded.
    #[error("failed to serialize entries: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Writing the new contents failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Outcome of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Copy of the previous file, if one existed.
    pub backup: Option<PathBuf>,
    /// Number of entries written.
    pub written: usize,
}

/// A backup copy found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    /// Location of the copy.
    pub path: PathBuf,
    /// Local time encoded in the file name.
    pub taken_at: NaiveDateTime,
    /// Suffix separating backups that share a timestamp; `0` when absent.
    pub sequence: u32,
}

/// Load all entries from `path`. A missing file is an empty dataset.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<Entry>, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "data file missing, starting empty");
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<Entry> = serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), count = entries.len(), "Loaded entries");
    Ok(entries)
}

/// Write `entries` to `path`, first copying any existing file into `backup_dir`.
///
/// The backup is complete before the data file is touched, so a failed
/// backup leaves the previous contents in place.
pub fn save(
    path: impl AsRef<Path>,
    entries: &[Entry],
    backup_dir: impl AsRef<Path>,
) -> Result<SaveReport, SaveError> {
    let path = path.as_ref();
    let serialized = serialize(entries)?;

    let backup = if path.exists() {
        Some(create_backup(
            path,
            backup_dir.as_ref(),
            Local::now().naive_local(),
        )?)
    } else {
        None
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SaveError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, serialized).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        count = entries.len(),
        backup = ?backup,
        "Saved entries"
    );
    Ok(SaveReport {
        backup,
        written: entries.len(),
    })
}

/// Backups of `data_file` inside `backup_dir`, newest first.
pub fn list_backups(
    backup_dir: impl AsRef<Path>,
    data_file: impl AsRef<Path>,
) -> io::Result<Vec<BackupEntry>> {
    let backup_dir = backup_dir.as_ref();
    if !backup_dir.is_dir() {
        return Ok(Vec::new());
    }
    let stem = file_stem(data_file.as_ref());

    let mut backups = Vec::new();
    for entry in fs::read_dir(backup_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some(caps) = BACKUP_NAME_RE.captures(&file_name) else {
            continue;
        };
        if caps.get(1).map(|m| m.as_str()) != Some(stem.as_str()) {
            continue;
        }
        let Some(stamp) = caps.get(2) else {
            continue;
        };
        let sequence = match caps.get(3) {
            Some(m) => match m.as_str().parse() {
                Ok(sequence) => sequence,
                Err(_) => continue,
            },
            None => 0,
        };
        if let Ok(taken_at) = NaiveDateTime::parse_from_str(stamp.as_str(), BACKUP_TIMESTAMP_FORMAT)
        {
            backups.push(BackupEntry {
                path: entry.path(),
                taken_at,
                sequence,
            });
        }
    }

    backups.sort_by(|a, b| (b.taken_at, b.sequence).cmp(&(a.taken_at, a.sequence)));
    Ok(backups)
}

/// Name of the backup written for `data_file` at `taken_at`.
pub fn backup_file_name(data_file: &Path, taken_at: NaiveDateTime) -> String {
    format!(
        "{}_backup_{}.json",
        file_stem(data_file),
        taken_at.format(BACKUP_TIMESTAMP_FORMAT)
    )
}

fn create_backup(
    path: &Path,
    backup_dir: &Path,
    taken_at: NaiveDateTime,
) -> Result<PathBuf, SaveError> {
    let fail = |backup: &Path, source: io::Error| SaveError::Backup {
        path: path.to_path_buf(),
        backup: backup.to_path_buf(),
        source,
    };
    let first = backup_dir.join(backup_file_name(path, taken_at));
    fs::create_dir_all(backup_dir).map_err(|source| fail(&first, source))?;

    // Local timestamps repeat on a DST fall-back; suffix instead of overwriting.
    let mut backup = first;
    let mut sequence = 0_u32;
    while backup.exists() {
        sequence += 1;
        backup = backup_dir.join(format!(
            "{}_backup_{}_{sequence}.json",
            file_stem(path),
            taken_at.format(BACKUP_TIMESTAMP_FORMAT)
        ));
    }
    fs::copy(path, &backup).map_err(|source| fail(&backup, source))?;
    debug!(backup = %backup.display(), "Backup written");
    Ok(backup)
}

fn serialize(entries: &[Entry]) -> Result<String, SaveError> {
    let mut serialized = serde_json::to_string_pretty(entries)?;
    serialized.push('\n');
    Ok(serialized)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "games".to_string())
}
