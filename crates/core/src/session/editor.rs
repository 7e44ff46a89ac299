use std::{
    io,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    dataset::{self, BackupEntry, LoadError, SaveReport},
    models::{Entry, Field, FormFields},
    probe::{ProbeReport, UrlChecker},
    search,
    validation::{self, ValidationError},
};

use super::models::{CreateOutcome, Mode, PendingCreate, SessionError};

/// The single editing session of a running editor.
///
/// Owns the dataset, the current search view and the form buffer. All
/// dataset mutations go through the commit/delete operations here.
#[derive(Debug, Clone)]
pub struct EditSession {
    data_file: PathBuf,
    backup_dir: PathBuf,
    entries: Vec<Entry>,
    query: String,
    view: Vec<usize>,
    mode: Mode,
    form: FormFields,
    dirty: bool,
    pending_changes: bool,
}

impl EditSession {
    /// Start a session over already-loaded entries, ready to create a new one.
    pub fn new(
        data_file: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        entries: Vec<Entry>,
    ) -> Self {
        let mut session = Self {
            data_file: data_file.into(),
            backup_dir: backup_dir.into(),
            entries,
            query: String::new(),
            view: Vec::new(),
            mode: Mode::Creating,
            form: FormFields::default(),
            dirty: false,
            pending_changes: false,
        };
        session.refresh_view();
        session
    }

    /// Open the data file named by `config`.
    ///
    /// A load failure still yields a usable, empty session; the error is
    /// handed back so the caller can report it.
    pub fn open(config: &AppConfig) -> (Self, Option<LoadError>) {
        let (entries, error) = match dataset::load(&config.data_file) {
            Ok(entries) => (entries, None),
            Err(err) => {
                warn!(%err, "Initial load failed, starting with an empty list");
                (Vec::new(), Some(err))
            }
        };
        (
            Self::new(config.data_file.clone(), config.backup_dir(), entries),
            error,
        )
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Every entry in dataset order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Entries visible under the current query with their dataset positions.
    pub fn view(&self) -> Vec<(usize, &Entry)> {
        self.view
            .iter()
            .filter_map(|&position| self.entries.get(position).map(|entry| (position, entry)))
            .collect()
    }

    pub fn view_len(&self) -> usize {
        self.view.len()
    }

    /// Position of the edited entry within the current view, if it is shown.
    pub fn selected_index(&self) -> Option<usize> {
        match self.mode {
            Mode::Creating => None,
            Mode::Editing { position } => self.view.iter().position(|&p| p == position),
        }
    }

    /// Entry currently bound to the form, if any.
    pub fn selected_entry(&self) -> Option<&Entry> {
        match self.mode {
            Mode::Creating => None,
            Mode::Editing { position } => self.entries.get(position),
        }
    }

    pub fn form(&self) -> &FormFields {
        &self.form
    }

    pub fn field(&self, field: Field) -> &str {
        self.form.get(field)
    }

    /// Unsaved form edits since the last commit, cancel, load or save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Dataset changed in memory since it was last loaded or saved.
    pub fn has_pending_changes(&self) -> bool {
        self.pending_changes
    }

    /// Whether quitting now would lose anything.
    pub fn needs_exit_confirmation(&self) -> bool {
        self.dirty || self.pending_changes
    }

    /// Edit one form field.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value);
        self.dirty = true;
    }

    /// Switch to creating a new entry with an empty form.
    pub fn start_create(&mut self) {
        self.mode = Mode::Creating;
        self.form.clear();
        debug!("Entered create mode");
    }

    /// Bind the form to the entry at `index` in the current view.
    ///
    /// Unsaved form edits are replaced without warning.
    pub fn select(&mut self, index: usize) -> Result<&Entry, SessionError> {
        let position = *self
            .view
            .get(index)
            .ok_or(SessionError::SelectionOutOfRange {
                index,
                len: self.view.len(),
            })?;
        let entry = self
            .entries
            .get(position)
            .ok_or(SessionError::SelectionOutOfRange {
                index,
                len: self.view.len(),
            })?;
        self.form = FormFields::from_entry(entry);
        self.mode = Mode::Editing { position };
        debug!(index, position, "Selected entry");
        Ok(entry)
    }

    /// Re-filter the view. Returns the number of matches.
    pub fn search(&mut self, query: &str) -> usize {
        self.query = query.to_string();
        self.refresh_view();
        self.view.len()
    }

    /// Build and validate an entry from the current form.
    pub fn candidate(&self) -> Result<Entry, ValidationError> {
        let entry = self.form.to_entry();
        validation::validate(&entry)?;
        Ok(entry)
    }

    /// Validate the form and probe its URLs without touching the dataset.
    pub fn prepare_create<C>(&self, checker: &C) -> Result<PendingCreate, SessionError>
    where
        C: UrlChecker + ?Sized,
    {
        self.require_creating("create")?;
        let entry = self.candidate()?;
        let report = checker.check_all(&entry);
        info!(
            name = %entry.name,
            checked = report.total_checked,
            valid = report.valid_count,
            "URL check finished"
        );
        Ok(PendingCreate::new(entry, report))
    }

    /// Append a prepared entry and switch to editing it.
    ///
    /// The search is cleared so the new entry is visible.
    pub fn finish_create(&mut self, pending: PendingCreate) -> Result<usize, SessionError> {
        self.require_creating("create")?;
        validation::validate(&pending.entry)?;

        self.entries.push(pending.entry);
        let position = self.entries.len() - 1;
        self.query.clear();
        self.refresh_view();
        self.form = FormFields::from_entry(&self.entries[position]);
        self.mode = Mode::Editing { position };
        self.dirty = false;
        self.pending_changes = true;
        info!(position, total = self.entries.len(), "Entry created");
        Ok(position)
    }

    /// Validate, probe and append the form as a new entry.
    ///
    /// `confirm` is consulted only when some probed URL failed; returning
    /// `false` abandons the create and leaves the session untouched.
    pub fn commit_create<C, F>(
        &mut self,
        checker: &C,
        confirm: F,
    ) -> Result<CreateOutcome, SessionError>
    where
        C: UrlChecker + ?Sized,
        F: FnOnce(&ProbeReport) -> bool,
    {
        let pending = self.prepare_create(checker)?;
        if pending.needs_confirmation() && !confirm(&pending.report) {
            debug!("Create cancelled after URL check");
            return Ok(CreateOutcome::Cancelled {
                report: pending.report,
            });
        }
        let report = pending.report.clone();
        let position = self.finish_create(pending)?;
        Ok(CreateOutcome::Created { position, report })
    }

    /// Replace the edited entry with the form contents.
    ///
    /// Keys the editor does not understand are carried over from the old entry.
    pub fn commit_update(&mut self) -> Result<usize, SessionError> {
        let position = self.require_editing("update")?;
        let mut candidate = self.candidate()?;
        let slot = self
            .entries
            .get_mut(position)
            .ok_or(SessionError::SelectionOutOfRange {
                index: position,
                len: self.view.len(),
            })?;
        candidate.extra = std::mem::take(&mut slot.extra);
        *slot = candidate;

        self.form = FormFields::from_entry(&self.entries[position]);
        self.refresh_view();
        self.dirty = false;
        self.pending_changes = true;
        info!(position, "Entry updated");
        Ok(position)
    }

    /// Discard the new-entry form.
    pub fn cancel_create(&mut self) -> Result<(), SessionError> {
        self.require_creating("cancel")?;
        self.form.clear();
        self.dirty = false;
        Ok(())
    }

    /// Remove the edited entry. Confirmation is the caller's job.
    pub fn delete_selected(&mut self) -> Result<Entry, SessionError> {
        let position = self.require_editing("delete")?;
        if position >= self.entries.len() {
            return Err(SessionError::SelectionOutOfRange {
                index: position,
                len: self.view.len(),
            });
        }
        let removed = self.entries.remove(position);
        self.refresh_view();
        self.form.clear();
        self.mode = Mode::Creating;
        self.dirty = false;
        self.pending_changes = true;
        info!(position, name = %removed.name, "Entry deleted");
        Ok(removed)
    }

    /// Re-read the data file, replacing the in-memory dataset.
    ///
    /// On failure the current dataset is kept.
    pub fn load(&mut self) -> Result<usize, SessionError> {
        let entries = dataset::load(&self.data_file)?;
        self.entries = entries;
        self.query.clear();
        self.refresh_view();
        self.mode = Mode::Creating;
        self.form.clear();
        self.dirty = false;
        self.pending_changes = false;
        Ok(self.entries.len())
    }

    /// Write the dataset to disk, backing up the previous file first.
    ///
    /// Open edits to an existing entry are committed before writing; if
    /// they do not validate nothing is written.
    pub fn save(&mut self) -> Result<SaveReport, SessionError> {
        if self.dirty && !self.mode.is_creating() {
            self.commit_update()?;
        }
        let report = dataset::save(&self.data_file, &self.entries, &self.backup_dir)?;
        self.dirty = false;
        self.pending_changes = false;
        Ok(report)
    }

    /// Backups of the data file on disk, newest first.
    pub fn backups(&self) -> io::Result<Vec<BackupEntry>> {
        dataset::list_backups(&self.backup_dir, &self.data_file)
    }

    fn refresh_view(&mut self) {
        self.view = search::matching_indices(&self.entries, &self.query);
    }

    fn require_creating(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.mode {
            Mode::Creating => Ok(()),
            mode => Err(SessionError::InvalidState { operation, mode }),
        }
    }

    fn require_editing(&self, operation: &'static str) -> Result<usize, SessionError> {
        match self.mode {
            Mode::Editing { position } => Ok(position),
            mode => Err(SessionError::InvalidState { operation, mode }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SaveError;
    use crate::probe::{ProbeFailure, UrlStatus};
    use anyhow::Result;
    use serde_json::json;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Reachable;

    impl UrlChecker for Reachable {
        fn check(&self, _url: &str) -> UrlStatus {
            UrlStatus::Valid(200)
        }
    }

    struct Unreachable;

    impl UrlChecker for Unreachable {
        fn check(&self, _url: &str) -> UrlStatus {
            UrlStatus::Invalid(ProbeFailure::Transport("timed out".to_string()))
        }
    }

    fn game(name: &str, tags: &[&str]) -> Entry {
        Entry {
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            githuburl: format!("https://github.com/example/{}", name.to_lowercase()),
            ..Entry::default()
        }
    }

    fn session_with(entries: Vec<Entry>) -> (TempDir, EditSession) {
        let dir = tempdir().expect("tempdir");
        let session = EditSession::new(
            dir.path().join("games.json"),
            dir.path().join("backup"),
            entries,
        );
        (dir, session)
    }

    fn fill(session: &mut EditSession, name: &str) {
        session.set_field(Field::Name, name);
        session.set_field(Field::GithubUrl, "https://github.com/example/new");
    }

    #[test]
    fn starts_in_create_mode_with_everything_visible() {
        let (_dir, session) = session_with(vec![game("A", &[]), game("B", &[])]);
        assert_eq!(session.mode(), Mode::Creating);
        assert!(!session.is_dirty());
        assert_eq!(session.view_len(), 2);
        assert_eq!(session.selected_index(), None);
    }

    #[test]
    fn create_appends_and_selects_new_entry() -> Result<()> {
        let (_dir, mut session) = session_with(vec![game("A", &["RPG"]), game("B", &[])]);
        session.search("rpg");
        fill(&mut session, "Brand New");
        session.set_field(Field::Tags, "Puzzle, , Casual");

        let outcome = session.commit_create(&Reachable, |_| panic!("no confirmation needed"))?;
        let CreateOutcome::Created { position, report } = outcome else {
            panic!("expected create");
        };
        assert_eq!(position, 2);
        assert_eq!(report.total_checked, 1);
        assert_eq!(session.entries().len(), 3);
        assert_eq!(session.entries()[2].name, "Brand New");
        assert_eq!(session.entries()[2].tags, vec!["Puzzle", "Casual"]);
        assert_eq!(session.query(), "");
        assert_eq!(session.view_len(), 3);
        assert_eq!(session.mode(), Mode::Editing { position: 2 });
        assert_eq!(session.selected_index(), Some(2));
        assert_eq!(session.field(Field::Tags), "Puzzle, Casual");
        assert!(!session.is_dirty());
        assert!(session.has_pending_changes());
        Ok(())
    }

    #[test]
    fn create_with_invalid_form_stays_in_create_mode() {
        let (_dir, mut session) = session_with(vec![]);
        session.set_field(Field::Name, "No links");
        let err = session
            .commit_create(&Reachable, |_| true)
            .expect_err("validation should fail");
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::NoReferenceUrl)
        ));
        assert_eq!(session.mode(), Mode::Creating);
        assert!(session.entries().is_empty());
        assert!(session.is_dirty());
    }

    #[test]
    fn failed_probes_require_confirmation() -> Result<()> {
        let (_dir, mut session) = session_with(vec![]);
        fill(&mut session, "Flaky");

        let mut asked = false;
        let outcome = session.commit_create(&Unreachable, |report| {
            asked = true;
            assert_eq!(report.valid_count, 0);
            false
        })?;
        assert!(asked);
        assert!(matches!(outcome, CreateOutcome::Cancelled { .. }));
        assert!(session.entries().is_empty());
        assert_eq!(session.mode(), Mode::Creating);
        assert!(session.is_dirty());

        let outcome = session.commit_create(&Unreachable, |_| true)?;
        assert!(matches!(outcome, CreateOutcome::Created { position: 0, .. }));
        assert_eq!(session.entries().len(), 1);
        Ok(())
    }

    #[test]
    fn update_replaces_entry_and_keeps_unknown_keys() -> Result<()> {
        let mut original = game("A", &["RPG"]);
        original.extra.insert("rating".to_string(), json!(4));
        let (_dir, mut session) = session_with(vec![original, game("B", &[])]);

        session.select(0)?;
        session.set_field(Field::Version, "2.0");
        let position = session.commit_update()?;
        assert_eq!(position, 0);
        assert_eq!(session.entries()[0].version, "2.0");
        assert_eq!(session.entries()[0].extra.get("rating"), Some(&json!(4)));
        assert_eq!(session.selected_index(), Some(0));
        assert!(!session.is_dirty());
        Ok(())
    }

    #[test]
    fn update_rejects_unpaired_download_url() -> Result<()> {
        let entries: Vec<Entry> = serde_json::from_value(json!([
            {"name": "A", "url": "http://x", "buildFile": "a.exe"}
        ]))?;
        let (_dir, mut session) = session_with(entries.clone());

        session.select(0)?;
        session.set_field(Field::BuildFile, "");
        let err = session.commit_update().expect_err("should be rejected");
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::UnpairedDownloadUrl)
        ));
        assert_eq!(session.entries(), entries.as_slice());
        assert_eq!(session.mode(), Mode::Editing { position: 0 });
        Ok(())
    }

    #[test]
    fn selection_resolves_through_the_filtered_view() -> Result<()> {
        let (_dir, mut session) = session_with(vec![
            game("Alpha", &["Action"]),
            game("Beta", &["RPG"]),
            game("Gamma", &["rpg"]),
        ]);
        assert_eq!(session.search("RPG"), 2);
        let selected = session.select(1)?;
        assert_eq!(selected.name, "Gamma");
        assert_eq!(session.mode(), Mode::Editing { position: 2 });

        session.set_field(Field::Tags, "Action");
        session.commit_update()?;
        assert_eq!(session.entries()[2].tags, vec!["Action"]);
        assert_eq!(session.view_len(), 1);
        assert_eq!(session.selected_index(), None);
        assert_eq!(session.selected_entry().map(|e| e.name.as_str()), Some("Gamma"));
        Ok(())
    }

    #[test]
    fn select_out_of_range_is_an_error() {
        let (_dir, mut session) = session_with(vec![game("A", &[])]);
        let err = session.select(3).expect_err("out of range");
        assert!(matches!(
            err,
            SessionError::SelectionOutOfRange { index: 3, len: 1 }
        ));
        assert_eq!(session.mode(), Mode::Creating);
    }

    #[test]
    fn delete_removes_entry_from_every_view() -> Result<()> {
        let (_dir, mut session) = session_with(vec![
            game("Keep", &["RPG"]),
            game("Drop", &["RPG"]),
        ]);
        session.search("rpg");
        session.select(1)?;
        let removed = session.delete_selected()?;
        assert_eq!(removed.name, "Drop");
        assert_eq!(session.entries().len(), 1);
        assert_eq!(session.mode(), Mode::Creating);
        assert_eq!(session.field(Field::Name), "");
        for query in ["", "rpg", "drop"] {
            session.search(query);
            assert!(session.view().iter().all(|(_, e)| e.name != "Drop"));
        }
        Ok(())
    }

    #[test]
    fn operations_in_the_wrong_mode_are_rejected() -> Result<()> {
        let (_dir, mut session) = session_with(vec![game("A", &[])]);
        assert!(matches!(
            session.commit_update(),
            Err(SessionError::InvalidState { operation: "update", .. })
        ));
        assert!(matches!(
            session.delete_selected(),
            Err(SessionError::InvalidState { operation: "delete", .. })
        ));

        session.select(0)?;
        assert!(matches!(
            session.cancel_create(),
            Err(SessionError::InvalidState { operation: "cancel", .. })
        ));
        assert!(matches!(
            session.commit_create(&Reachable, |_| true),
            Err(SessionError::InvalidState { operation: "create", .. })
        ));
        assert_eq!(session.entries().len(), 1);

        session.start_create();
        assert_eq!(session.mode(), Mode::Creating);
        assert_eq!(session.field(Field::Name), "");
        Ok(())
    }

    #[test]
    fn cancel_create_clears_form_and_dirty_flag() -> Result<()> {
        let (_dir, mut session) = session_with(vec![]);
        fill(&mut session, "Draft");
        assert!(session.needs_exit_confirmation());
        session.cancel_create()?;
        assert!(session.form().is_blank());
        assert!(!session.is_dirty());
        assert!(!session.needs_exit_confirmation());
        Ok(())
    }

    #[test]
    fn open_missing_file_then_save_creates_empty_array() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::default().with_data_file(dir.path().join("games.json"));
        let (mut session, error) = EditSession::open(&config);
        assert!(error.is_none());
        assert!(session.entries().is_empty());

        let report = session.save()?;
        assert_eq!(report.backup, None);
        assert_eq!(fs::read_to_string(&config.data_file)?.trim(), "[]");
        assert!(!config.backup_dir().exists());
        Ok(())
    }

    #[test]
    fn open_malformed_file_reports_error_and_starts_empty() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("games.json");
        fs::write(&path, "[{\"name\": ")?;
        let config = AppConfig::default().with_data_file(&path);
        let (session, error) = EditSession::open(&config);
        assert!(matches!(error, Some(LoadError::Parse { .. })));
        assert!(session.entries().is_empty());
        Ok(())
    }

    #[test]
    fn failed_reload_keeps_current_dataset() -> Result<()> {
        let (dir, mut session) = session_with(vec![game("A", &[])]);
        fs::write(dir.path().join("games.json"), "oops")?;
        assert!(matches!(session.load(), Err(SessionError::Load(_))));
        assert_eq!(session.entries().len(), 1);
        Ok(())
    }

    #[test]
    fn save_applies_open_edit_and_round_trips() -> Result<()> {
        let (dir, mut session) = session_with(vec![game("A", &["RPG"]), game("B", &[])]);
        session.select(1)?;
        session.set_field(Field::Description, "Edited before save");
        let report = session.save()?;
        assert_eq!(report.written, 2);
        assert!(!session.needs_exit_confirmation());

        let loaded = dataset::load(dir.path().join("games.json"))?;
        assert_eq!(loaded, session.entries());
        assert_eq!(loaded[1].description, "Edited before save");

        fs::write(dir.path().join("games.json"), "[]")?;
        session.save()?;
        let backups = session.backups()?;
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0].path)?, "[]");

        assert_eq!(session.load()?, 2);
        assert_eq!(session.mode(), Mode::Creating);
        Ok(())
    }

    #[test]
    fn save_with_invalid_open_edit_writes_nothing() -> Result<()> {
        let (dir, mut session) = session_with(vec![game("A", &[])]);
        session.select(0)?;
        session.set_field(Field::Name, " ");
        assert!(matches!(
            session.save(),
            Err(SessionError::Validation(ValidationError::EmptyName))
        ));
        assert!(!dir.path().join("games.json").exists());
        assert!(session.is_dirty());
        Ok(())
    }

    #[test]
    fn failed_save_keeps_session_state() -> Result<()> {
        let (dir, mut session) = session_with(vec![game("A", &[])]);
        fs::write(dir.path().join("games.json"), "[]")?;
        fs::write(session.backup_dir(), "not a directory")?;

        fill(&mut session, "Unsaved");
        session.commit_create(&Reachable, |_| true)?;
        let before = session.entries().to_vec();

        let err = session.save().expect_err("backup dir is a file");
        assert!(matches!(err, SessionError::Save(SaveError::Backup { .. })));
        assert_eq!(session.entries(), before.as_slice());
        assert!(session.has_pending_changes());
        assert!(session.needs_exit_confirmation());
        assert_eq!(fs::read_to_string(dir.path().join("games.json"))?, "[]");
        assert!(session.backups()?.is_empty());
        Ok(())
    }
}
