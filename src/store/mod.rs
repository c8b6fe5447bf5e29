mod drafts;
mod filters;
mod service_logs;

pub use drafts::DraftsState;
pub use filters::filter_logs;
pub use service_logs::ServiceLogsState;

use crate::models::PersistedSnapshot;

pub const SNAPSHOT_VERSION: u32 = 1;

/// The single owner of drafts and committed logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub drafts: DraftsState,
    pub service_logs: ServiceLogsState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: PersistedSnapshot) -> Self {
        Self {
            drafts: DraftsState::from_snapshot(snapshot.drafts),
            service_logs: ServiceLogsState::from_snapshot(snapshot.service_logs),
        }
    }

    pub fn to_snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            version: SNAPSHOT_VERSION,
            drafts: self.drafts.to_snapshot(),
            service_logs: self.service_logs.to_snapshot(),
        }
    }
}
