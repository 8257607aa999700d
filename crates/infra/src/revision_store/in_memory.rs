use std::collections::HashMap;
use std::sync::RwLock;

use trafo_core::{RevisionGroupId, State, TransformationRevision, TransformationRevisionId, WorkflowWiring};

use super::r#trait::{RevisionFilter, RevisionStore, RevisionStoreError, UpdateOptions};

/// In-memory revision store.
///
/// Intended for tests/dev and single-node deployments without a database.
#[derive(Debug, Default)]
pub struct InMemoryRevisionStore {
    revisions: RwLock<HashMap<TransformationRevisionId, TransformationRevision>>,
}

impl InMemoryRevisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `revisions`.
    pub fn with_revisions(
        revisions: impl IntoIterator<Item = TransformationRevision>,
    ) -> Result<Self, RevisionStoreError> {
        let store = Self::new();
        for rev in revisions {
            store.store(rev)?;
        }
        Ok(store)
    }
}

fn poisoned() -> RevisionStoreError {
    RevisionStoreError::Integrity("lock poisoned".to_string())
}

fn not_found(id: TransformationRevisionId) -> RevisionStoreError {
    RevisionStoreError::NotFound(format!("transformation revision {id}"))
}

impl RevisionStore for InMemoryRevisionStore {
    fn store(&self, revision: TransformationRevision) -> Result<(), RevisionStoreError> {
        revision.validate()?;

        let mut revisions = self.revisions.write().map_err(|_| poisoned())?;
        if revisions.contains_key(&revision.id) {
            return Err(RevisionStoreError::Integrity(format!(
                "transformation revision {} already exists",
                revision.id
            )));
        }
        revisions.insert(revision.id, revision);
        Ok(())
    }

    fn read(&self, id: TransformationRevisionId) -> Result<TransformationRevision, RevisionStoreError> {
        let revisions = self.revisions.read().map_err(|_| poisoned())?;
        revisions.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    fn update_or_create(
        &self,
        mut revision: TransformationRevision,
        options: UpdateOptions,
    ) -> Result<TransformationRevision, RevisionStoreError> {
        if options.strip_wiring {
            revision.test_wiring = WorkflowWiring::default();
        }
        revision.validate()?;

        let mut revisions = self.revisions.write().map_err(|_| poisoned())?;
        if let Some(current) = revisions.get(&revision.id) {
            current.check_replacement(&revision, options.allow_overwrite_released)?;
        }
        revisions.insert(revision.id, revision.clone());
        Ok(revision)
    }

    fn delete(&self, id: TransformationRevisionId, ignore_state: bool) -> Result<(), RevisionStoreError> {
        let mut revisions = self.revisions.write().map_err(|_| poisoned())?;
        let current = revisions.get(&id).ok_or_else(|| not_found(id))?;
        if !ignore_state && current.state != State::Draft {
            return Err(RevisionStoreError::ModelConstraintViolation(format!(
                "transformation revision {id} is {:?}; only DRAFT revisions can be deleted",
                current.state
            )));
        }
        revisions.remove(&id);
        Ok(())
    }

    fn list(&self, filter: &RevisionFilter) -> Result<Vec<TransformationRevision>, RevisionStoreError> {
        let revisions = self.revisions.read().map_err(|_| poisoned())?;
        let mut out: Vec<TransformationRevision> =
            revisions.values().filter(|r| filter.matches(r)).cloned().collect();
        out.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.version_tag.cmp(&b.version_tag))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(out)
    }

    fn latest_released_id(
        &self,
        group: RevisionGroupId,
    ) -> Result<TransformationRevisionId, RevisionStoreError> {
        let revisions = self.revisions.read().map_err(|_| poisoned())?;
        revisions
            .values()
            .filter(|r| r.revision_group_id == group && r.state == State::Released)
            .filter_map(|r| r.released_timestamp.map(|at| (at, r.id)))
            .max()
            .map(|(_, id)| id)
            .ok_or_else(|| {
                RevisionStoreError::NotFound(format!(
                    "no released transformation revision in revision group {group}"
                ))
            })
    }
}
