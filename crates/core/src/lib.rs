#![warn(clippy::all, missing_docs)]

//! Core logic for the games list editor.
//!
//! This crate hosts the entry model and its validation rules, the JSON
//! persistence layer with backups, search, URL probing and the editing
//! session that ties them together for the terminal UI and any future
//! frontends.

pub mod config;
pub mod dataset;
pub mod models;
pub mod probe;
pub mod search;
pub mod session;
pub mod validation;

pub use config::AppConfig;
pub use dataset::{BackupEntry, LoadError, SaveError, SaveReport};
pub use models::{Entry, Field, FormFields};
pub use probe::{HttpUrlChecker, ProbeReport, UrlChecker, UrlStatus};
pub use session::{CreateOutcome, EditSession, Mode, PendingCreate, SessionError};
pub use validation::{validate, ValidationError};
