use crate::models::{SaveStatus, ServiceLogFormValues};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;

pub type CommitFn = Arc<dyn Fn(ServiceLogFormValues, &SaveTicket) + Send + Sync>;

#[derive(Default)]
struct PendingSave {
    generation: u64,
    handle: Option<JoinHandle<()>>,
    status: SaveStatus,
}

/// Identifies one scheduled write. It goes stale once a newer `schedule` or a `cancel`
/// happens, so a commit that already left its timer can still back out.
pub struct SaveTicket {
    generation: u64,
    pending: Arc<Mutex<PendingSave>>,
}

impl SaveTicket {
    pub fn is_current(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.generation == self.generation)
            .unwrap_or(false)
    }
}

/// Debounced autosave: every `schedule` call replaces the pending write, and only the
/// last one inside the quiet window reaches `commit`.
#[derive(Clone)]
pub struct Autosaver {
    pending: Arc<Mutex<PendingSave>>,
    delay: Duration,
    commit: CommitFn,
}

impl Autosaver {
    pub fn new(delay: Duration, commit: CommitFn) -> Self {
        Self {
            pending: Arc::new(Mutex::new(PendingSave::default())),
            delay,
            commit,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, values: ServiceLogFormValues) {
        let Ok(mut pending) = self.pending.lock() else {
            tracing::error!("autosave mutex poisoned, dropping change");
            return;
        };
        if let Some(handle) = pending.handle.take() {
            handle.abort();
        }
        pending.generation = pending.generation.wrapping_add(1);
        pending.status = SaveStatus::Saving;

        let ticket = SaveTicket {
            generation: pending.generation,
            pending: self.pending.clone(),
        };
        let delay = self.delay;
        let commit = self.commit.clone();
        pending.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // the commit re-checks the ticket under its own lock
            commit(values, &ticket);
            if let Ok(mut pending) = ticket.pending.lock() {
                // a newer schedule owns the slot now
                if pending.generation == ticket.generation {
                    pending.handle = None;
                    pending.status = SaveStatus::Saved;
                }
            }
        }));
    }

    /// Drops the pending write, if any, and invalidates every outstanding ticket.
    /// Returns whether a write was pending.
    pub fn cancel(&self) -> bool {
        let Ok(mut pending) = self.pending.lock() else {
            return false;
        };
        pending.generation = pending.generation.wrapping_add(1);
        match pending.handle.take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.handle.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    pub fn status(&self) -> SaveStatus {
        self.pending
            .lock()
            .map(|pending| pending.status)
            .unwrap_or_default()
    }

    pub fn set_status(&self, status: SaveStatus) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.status = status;
        }
    }
}
