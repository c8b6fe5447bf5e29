use crate::autosave::{Autosaver, CommitFn, SaveTicket};
use crate::csv_import::{parse_service_logs_csv, CSV_TEMPLATE};
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::form::{EditServiceLogDialog, FieldChange, ServiceLogForm};
use crate::models::{
    AppSettings, Draft, ImportOutcome, SaveStatus, ServiceLog, ServiceLogFilters, ServiceLogFormValues,
};
use crate::persistence::{BlobStore, SnapshotPersistor};
use crate::store::{filter_logs, AppState};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Duration;

/// Composition root: owns the central state, the entry form, persistence and autosave.
/// Every mutation is mirrored to the blob store; storage failures are logged, not returned.
pub struct ServiceLogApp {
    state: Arc<Mutex<AppState>>,
    form: Mutex<ServiceLogForm>,
    persistor: SnapshotPersistor,
    autosaver: Autosaver,
    settings: AppSettings,
}

impl ServiceLogApp {
    /// Opens (or creates) `<data_dir>/state.sqlite` and restores the last snapshot.
    pub fn open(data_dir: &Path) -> AppResult<Self> {
        let db = Arc::new(Database::new(&data_dir.join("state.sqlite"))?);
        let settings = db.get_settings()?;
        Ok(Self::with_store(db, settings))
    }

    pub fn with_store(store: Arc<dyn BlobStore>, settings: AppSettings) -> Self {
        let persistor = SnapshotPersistor::new(store, settings.storage_key.clone());
        let restored = match persistor.restore() {
            Ok(Some(state)) => {
                tracing::info!(
                    drafts = state.drafts.len(),
                    service_logs = state.service_logs.len(),
                    "restored persisted state"
                );
                state
            }
            Ok(None) => AppState::new(),
            Err(error) => {
                tracing::warn!(error = %error, "failed to load persisted state, starting empty");
                AppState::new()
            }
        };

        let mut form = ServiceLogForm::new();
        if let Some(draft) = restored.drafts.active_draft() {
            form.load(draft.values.clone());
        }

        let state = Arc::new(Mutex::new(restored));
        let commit_state = state.clone();
        let commit_persistor = persistor.clone();
        let commit: CommitFn = Arc::new(move |values: ServiceLogFormValues, ticket: &SaveTicket| {
            let Ok(mut state) = commit_state.lock() else {
                tracing::error!("state mutex poisoned, autosave dropped");
                return;
            };
            // checked under the state lock so a draft switch cannot slip in between
            if !ticket.is_current() {
                tracing::debug!("autosave cancelled before commit");
                return;
            }
            let draft_id = state.drafts.upsert_active_draft(values);
            tracing::debug!(draft_id = %draft_id, "autosaved active draft");
            mirror(&commit_persistor, &state);
        });
        let autosaver = Autosaver::new(Duration::from_millis(settings.autosave_debounce_ms), commit);

        Self {
            state,
            form: Mutex::new(form),
            persistor,
            autosaver,
            settings,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn save_status(&self) -> SaveStatus {
        self.autosaver.status()
    }

    pub fn form_values(&self) -> AppResult<ServiceLogFormValues> {
        Ok(self.lock_form()?.values().clone())
    }

    /// Updates one form field and schedules an autosave of the whole form.
    /// Must be called from within a tokio runtime.
    pub fn edit_field(&self, change: FieldChange) -> AppResult<ServiceLogFormValues> {
        let values = self.lock_form()?.apply(change).clone();
        self.autosaver.schedule(values.clone());
        Ok(values)
    }

    pub fn create_draft_from_form(&self) -> AppResult<String> {
        self.autosaver.cancel();
        let values = self.form_values()?;
        let id = self.mutate(|state| state.drafts.create_draft(values))?;
        self.autosaver.set_status(SaveStatus::Saved);
        Ok(id)
    }

    /// Switches the active draft; the form picks up the newly active draft's values.
    /// Reselecting the active draft or naming an unknown one leaves pending edits alone.
    pub fn select_draft(&self, id: Option<&str>) -> AppResult<()> {
        let switches = {
            let state = self.lock_state()?;
            let current = state.drafts.active_draft_id();
            match id {
                Some(id) => state.drafts.get(id).is_some() && current != Some(id),
                None => current.is_some(),
            }
        };
        if !switches {
            return Ok(());
        }
        self.autosaver.cancel();
        let active = self.mutate(|state| {
            state.drafts.set_active_draft(id);
            state.drafts.active_draft().map(|draft| draft.values.clone())
        })?;
        if let Some(values) = active {
            self.lock_form()?.load(values);
        }
        Ok(())
    }

    pub fn delete_active_draft(&self) -> AppResult<Option<Draft>> {
        self.autosaver.cancel();
        let (removed, next) = self.mutate(|state| {
            let removed = state.drafts.delete_active_draft();
            let next = state.drafts.active_draft().map(|draft| draft.values.clone());
            (removed, next)
        })?;
        {
            let mut form = self.lock_form()?;
            match next {
                Some(values) => form.load(values),
                None => form.reset(),
            }
        }
        self.autosaver.set_status(SaveStatus::Idle);
        Ok(removed)
    }

    pub fn clear_all_drafts(&self) -> AppResult<()> {
        self.autosaver.cancel();
        self.mutate(|state| state.drafts.clear_all_drafts())?;
        self.lock_form()?.reset();
        self.autosaver.set_status(SaveStatus::Idle);
        Ok(())
    }

    /// Commits the form as a service log and retires the active draft.
    /// Invalid input returns `AppError::Validation` and changes nothing.
    pub fn submit(&self) -> AppResult<String> {
        let values = self.lock_form()?.validate()?;
        self.autosaver.cancel();
        let (id, next) = self.mutate(|state| {
            let id = state.service_logs.create_service_log(values);
            state.drafts.delete_active_draft();
            let next = state.drafts.active_draft().map(|draft| draft.values.clone());
            (id, next)
        })?;
        {
            let mut form = self.lock_form()?;
            match next {
                Some(values) => form.load(values),
                None => form.reset(),
            }
        }
        self.autosaver.set_status(SaveStatus::Idle);
        tracing::info!(log_id = %id, "service log submitted");
        Ok(id)
    }

    pub fn open_edit(&self, id: &str) -> AppResult<Option<EditServiceLogDialog>> {
        let state = self.lock_state()?;
        Ok(state.service_logs.get(id).map(EditServiceLogDialog::open))
    }

    /// Returns whether the log still existed; a stale id is ignored.
    pub fn save_edit(&self, dialog: &EditServiceLogDialog) -> AppResult<bool> {
        let changes = dialog.validate()?;
        self.mutate(|state| state.service_logs.update_service_log(dialog.log_id(), changes))
    }

    pub fn delete_service_log(&self, id: &str) -> AppResult<bool> {
        self.mutate(|state| state.service_logs.delete_service_log(id))
    }

    /// Imports every valid row; rejected rows are reported in the outcome.
    pub fn import_csv(&self, content: &str) -> AppResult<ImportOutcome> {
        let parsed = parse_service_logs_csv(content);
        let imported = if parsed.rows.is_empty() {
            0
        } else {
            self.mutate(|state| state.service_logs.create_service_logs_bulk(parsed.rows))?
        };
        tracing::info!(imported, rejected = parsed.errors.len(), "csv import finished");
        Ok(ImportOutcome {
            imported,
            errors: parsed.errors,
        })
    }

    pub fn import_summary(&self, outcome: &ImportOutcome) -> String {
        outcome.summary(self.settings.import_error_preview_limit)
    }

    pub fn csv_template(&self) -> &'static str {
        CSV_TEMPLATE
    }

    pub fn service_logs(&self) -> AppResult<Vec<ServiceLog>> {
        Ok(self.lock_state()?.service_logs.items().to_vec())
    }

    pub fn visible_logs(&self, filters: &ServiceLogFilters) -> AppResult<Vec<ServiceLog>> {
        let state = self.lock_state()?;
        Ok(filter_logs(state.service_logs.items(), filters))
    }

    pub fn active_draft(&self) -> AppResult<Option<Draft>> {
        Ok(self.lock_state()?.drafts.active_draft().cloned())
    }

    pub fn drafts_list(&self) -> AppResult<Vec<Draft>> {
        Ok(self
            .lock_state()?
            .drafts
            .drafts_list()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Removes the persisted snapshot. In-memory state is left as is.
    pub fn purge_persisted_state(&self) -> AppResult<()> {
        self.persistor.purge()
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut AppState) -> R) -> AppResult<R> {
        let mut state = self.lock_state()?;
        let result = apply(&mut state);
        mirror(&self.persistor, &state);
        Ok(result)
    }

    fn lock_state(&self) -> AppResult<MutexGuard<'_, AppState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("state mutex poisoned".to_string()))
    }

    fn lock_form(&self) -> AppResult<MutexGuard<'_, ServiceLogForm>> {
        self.form
            .lock()
            .map_err(|_| AppError::Internal("form mutex poisoned".to_string()))
    }
}

impl Drop for ServiceLogApp {
    fn drop(&mut self) {
        self.autosaver.cancel();
    }
}

fn mirror(persistor: &SnapshotPersistor, state: &AppState) {
    if let Err(error) = persistor.save(state) {
        tracing::warn!(key = %persistor.key(), error = %error, "failed to persist state");
    }
}
