use crate::models::{ServiceLog, ServiceLogFormValues, ServiceLogsSnapshot};
use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

/// Committed logs, newest first. Ids are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceLogsState {
    items: Vec<ServiceLog>,
}

impl ServiceLogsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: ServiceLogsSnapshot) -> Self {
        let mut seen = HashSet::new();
        let before = snapshot.items.len();
        let items = snapshot
            .items
            .into_iter()
            .filter(|log| seen.insert(log.id.clone()))
            .collect::<Vec<_>>();
        if items.len() != before {
            tracing::warn!(dropped = before - items.len(), "dropped duplicate service log ids on restore");
        }
        Self { items }
    }

    pub fn to_snapshot(&self) -> ServiceLogsSnapshot {
        ServiceLogsSnapshot {
            items: self.items.clone(),
        }
    }

    pub fn create_service_log(&mut self, values: ServiceLogFormValues) -> String {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        self.items.insert(
            0,
            ServiceLog {
                id: id.clone(),
                values,
                created_at: now,
                updated_at: now,
            },
        );
        tracing::debug!(log_id = %id, "service log created");
        id
    }

    /// Inserts all records as one block at the front, keeping input order.
    pub fn create_service_logs_bulk(&mut self, values: Vec<ServiceLogFormValues>) -> usize {
        let now = Utc::now();
        let count = values.len();
        let block = values.into_iter().map(|values| ServiceLog {
            id: Uuid::new_v4().to_string(),
            values,
            created_at: now,
            updated_at: now,
        });
        self.items.splice(0..0, block);
        tracing::debug!(count, "service logs bulk created");
        count
    }

    /// Returns whether a record was updated; an unknown id is ignored.
    pub fn update_service_log(&mut self, id: &str, changes: ServiceLogFormValues) -> bool {
        let Some(target) = self.items.iter_mut().find(|log| log.id == id) else {
            tracing::debug!(log_id = %id, "update ignored for unknown service log");
            return false;
        };
        target.values = changes;
        target.updated_at = Utc::now();
        true
    }

    /// Returns whether a record was removed; an unknown id is ignored.
    pub fn delete_service_log(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|log| log.id != id);
        self.items.len() != before
    }

    pub fn items(&self) -> &[ServiceLog] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&ServiceLog> {
        self.items.iter().find(|log| log.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceLogsState;
    use crate::models::{ServiceLogFormValues, ServiceLogsSnapshot, ServiceType};

    fn values(provider_id: &str) -> ServiceLogFormValues {
        ServiceLogFormValues {
            provider_id: provider_id.to_string(),
            service_order: "SO-1".to_string(),
            car_id: "CAR-1".to_string(),
            odometer: 1000.0,
            engine_hours: 10.0,
            start_date: "2026-02-10".to_string(),
            end_date: "2026-02-11".to_string(),
            service_type: ServiceType::Planned,
            service_description: "Oil change and inspection".to_string(),
        }
    }

    fn providers(state: &ServiceLogsState) -> Vec<&str> {
        state
            .items()
            .iter()
            .map(|log| log.values.provider_id.as_str())
            .collect()
    }

    #[test]
    fn create_inserts_newest_first() {
        let mut state = ServiceLogsState::new();
        let first = state.create_service_log(values("A"));
        state.create_service_log(values("B"));

        assert_eq!(providers(&state), vec!["B", "A"]);
        let log = state.get(&first).expect("log");
        assert_eq!(log.created_at, log.updated_at);
    }

    #[test]
    fn bulk_create_inserts_block_in_input_order() {
        let mut state = ServiceLogsState::new();
        state.create_service_log(values("old"));

        let count = state.create_service_logs_bulk(vec![values("a"), values("b")]);
        assert_eq!(count, 2);
        assert_eq!(providers(&state), vec!["a", "b", "old"]);
        let items = state.items();
        assert_eq!(items[0].created_at, items[1].created_at);
        assert_ne!(items[0].id, items[1].id);
    }

    #[test]
    fn update_merges_changes_and_keeps_created_at() {
        let mut state = ServiceLogsState::new();
        let id = state.create_service_log(values("A"));
        let created_at = state.get(&id).expect("log").created_at;

        let changes = ServiceLogFormValues {
            service_type: ServiceType::Emergency,
            ..values("A2")
        };
        assert!(state.update_service_log(&id, changes.clone()));

        let log = state.get(&id).expect("log");
        assert_eq!(log.values, changes);
        assert_eq!(log.created_at, created_at);
        assert!(log.updated_at >= created_at);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut state = ServiceLogsState::new();
        state.create_service_log(values("A"));
        let before = state.clone();

        assert!(!state.update_service_log("missing", values("X")));
        assert!(!state.delete_service_log("missing"));
        assert_eq!(state, before);
    }

    #[test]
    fn delete_removes_matching_entry() {
        let mut state = ServiceLogsState::new();
        let id = state.create_service_log(values("A"));
        state.create_service_log(values("B"));

        assert!(state.delete_service_log(&id));
        assert_eq!(providers(&state), vec!["B"]);
    }

    #[test]
    fn restore_drops_duplicate_ids() {
        let mut state = ServiceLogsState::new();
        state.create_service_log(values("A"));
        let mut items = state.to_snapshot().items;
        items.push(items[0].clone());

        let restored = ServiceLogsState::from_snapshot(ServiceLogsSnapshot { items });
        assert_eq!(restored.len(), 1);
    }
}
