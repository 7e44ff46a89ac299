use std::fmt;

use thiserror::Error;

use crate::{
    dataset::{LoadError, SaveError},
    models::Entry,
    probe::ProbeReport,
    validation::ValidationError,
};

/// What the form is currently bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The form describes a new entry that is not in the dataset yet.
    Creating,
    /// The form edits the entry at `position` in the dataset.
    Editing {
        /// Index into the full dataset, independent of the search view.
        position: usize,
    },
}

impl Mode {
    pub fn is_creating(self) -> bool {
        matches!(self, Mode::Creating)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Creating => f.write_str("creating a new entry"),
            Mode::Editing { .. } => f.write_str("editing an existing entry"),
        }
    }
}

/// Errors surfaced by [`EditSession`](super::EditSession) operations.
///
/// Every variant leaves the session exactly as it was before the call.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{operation} is not available while {mode}")]
    InvalidState {
        operation: &'static str,
        mode: Mode,
    },
    #[error("no entry at list position {index} ({len} shown)")]
    SelectionOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// A validated, probed candidate waiting for the caller's go-ahead.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCreate {
    pub entry: Entry,
    pub report: ProbeReport,
}

impl PendingCreate {
    pub fn new(entry: Entry, report: ProbeReport) -> Self {
        Self { entry, report }
    }

    /// Whether the user should confirm before the entry is added.
    pub fn needs_confirmation(&self) -> bool {
        !self.report.all_valid()
    }
}

/// Result of [`EditSession::commit_create`](super::EditSession::commit_create).
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// The entry was appended at `position`.
    Created { position: usize, report: ProbeReport },
    /// The caller declined after seeing failed probes; nothing changed.
    Cancelled { report: ProbeReport },
}
