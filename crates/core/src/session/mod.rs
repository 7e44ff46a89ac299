#![allow(missing_docs)]

//! Editing session: form buffer, create/edit mode and dataset mutations.

pub mod editor;
mod models;

pub use editor::EditSession;
pub use models::{CreateOutcome, Mode, PendingCreate, SessionError};
