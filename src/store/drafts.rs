use crate::models::{Draft, DraftsSnapshot, ServiceLogFormValues};
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Drafts keyed by id plus the pointer to the one bound to the entry form.
/// `active_draft_id` is either `None` or a key of `items`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftsState {
    items: BTreeMap<String, Draft>,
    active_draft_id: Option<String>,
}

impl DraftsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds state from persisted data, dropping a dangling active pointer.
    pub fn from_snapshot(snapshot: DraftsSnapshot) -> Self {
        let DraftsSnapshot {
            mut items,
            active_draft_id,
        } = snapshot;
        // keys are authoritative; a mismatched embedded id is rewritten
        for (key, draft) in items.iter_mut() {
            if draft.id != *key {
                draft.id = key.clone();
            }
        }
        let active_draft_id = active_draft_id.filter(|id| items.contains_key(id));
        Self {
            items,
            active_draft_id,
        }
    }

    pub fn to_snapshot(&self) -> DraftsSnapshot {
        DraftsSnapshot {
            items: self.items.clone(),
            active_draft_id: self.active_draft_id.clone(),
        }
    }

    pub fn create_draft(&mut self, values: ServiceLogFormValues) -> String {
        let id = Uuid::new_v4().to_string();
        let draft = Draft {
            id: id.clone(),
            values,
            updated_at: Utc::now(),
        };
        self.items.insert(id.clone(), draft);
        self.active_draft_id = Some(id.clone());
        tracing::debug!(draft_id = %id, "draft created");
        id
    }

    /// Overwrites the active draft, or creates one when none is active.
    pub fn upsert_active_draft(&mut self, values: ServiceLogFormValues) -> String {
        let active = self
            .active_draft_id
            .as_ref()
            .and_then(|id| self.items.get_mut(id));
        match active {
            Some(draft) => {
                draft.values = values;
                draft.updated_at = Utc::now();
                draft.id.clone()
            }
            None => self.create_draft(values),
        }
    }

    /// `None` clears the pointer; an unknown id leaves it unchanged.
    pub fn set_active_draft(&mut self, id: Option<&str>) {
        match id {
            None => self.active_draft_id = None,
            Some(id) if self.items.contains_key(id) => self.active_draft_id = Some(id.to_string()),
            Some(id) => tracing::debug!(draft_id = %id, "ignoring unknown draft selection"),
        }
    }

    /// Removes the active draft and points at the first remaining key, if any.
    pub fn delete_active_draft(&mut self) -> Option<Draft> {
        let active_id = self.active_draft_id.take()?;
        let removed = self.items.remove(&active_id);
        self.active_draft_id = self.items.keys().next().cloned();
        tracing::debug!(
            draft_id = %active_id,
            next_active = ?self.active_draft_id,
            "active draft deleted"
        );
        removed
    }

    pub fn clear_all_drafts(&mut self) {
        self.items.clear();
        self.active_draft_id = None;
    }

    pub fn items(&self) -> &BTreeMap<String, Draft> {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Draft> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn active_draft_id(&self) -> Option<&str> {
        self.active_draft_id.as_deref()
    }

    pub fn active_draft(&self) -> Option<&Draft> {
        self.active_draft_id
            .as_ref()
            .and_then(|id| self.items.get(id))
    }

    /// Most recently updated first.
    pub fn drafts_list(&self) -> Vec<&Draft> {
        let mut drafts = self.items.values().collect::<Vec<_>>();
        drafts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        drafts
    }
}
