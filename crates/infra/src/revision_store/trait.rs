use thiserror::Error;

use trafo_core::{
    DomainError, RevisionGroupId, State, TransformationRevision, TransformationRevisionId, Type,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RevisionStoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Storing would break uniqueness or another storage-level rule.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// The revision itself is inconsistent (e.g. RELEASED without timestamp).
    #[error("invalid revision: {0}")]
    Invalid(String),

    /// The revision model forbids the requested change.
    #[error("model constraint violated: {0}")]
    ModelConstraintViolation(String),
}

impl From<DomainError> for RevisionStoreError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::ModelConstraintViolation(msg) => Self::ModelConstraintViolation(msg),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Invalid(msg),
        }
    }
}

/// Options for [`RevisionStore::update_or_create`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Permit arbitrary changes to a RELEASED revision.
    pub allow_overwrite_released: bool,
    /// Drop the stored test wiring.
    pub strip_wiring: bool,
}

/// Criteria for listing revisions. Unset fields match everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFilter {
    pub kind: Option<Type>,
    pub state: Option<State>,
    pub category: Option<String>,
    pub category_prefix: Option<String>,
    pub revision_group_id: Option<RevisionGroupId>,
    pub ids: Option<Vec<TransformationRevisionId>>,
    pub names: Option<Vec<String>>,
    /// Include DISABLED revisions unless a state filter says otherwise.
    pub include_deprecated: bool,
}

impl Default for RevisionFilter {
    fn default() -> Self {
        Self {
            kind: None,
            state: None,
            category: None,
            category_prefix: None,
            revision_group_id: None,
            ids: None,
            names: None,
            include_deprecated: true,
        }
    }
}

impl RevisionFilter {
    pub fn matches(&self, rev: &TransformationRevision) -> bool {
        if self.kind.is_some_and(|k| k != rev.kind) {
            return false;
        }
        if self.state.is_some_and(|s| s != rev.state) {
            return false;
        }
        if !self.include_deprecated && self.state.is_none() && rev.state == State::Disabled {
            return false;
        }
        if self.category.as_deref().is_some_and(|c| c != rev.category) {
            return false;
        }
        if self
            .category_prefix
            .as_deref()
            .is_some_and(|p| !rev.category.starts_with(p))
        {
            return false;
        }
        if self.revision_group_id.is_some_and(|g| g != rev.revision_group_id) {
            return false;
        }
        if self.ids.as_ref().is_some_and(|ids| !ids.contains(&rev.id)) {
            return false;
        }
        if self.names.as_ref().is_some_and(|names| !names.contains(&rev.name)) {
            return false;
        }
        true
    }
}

/// Revision persistence.
///
/// All operations are short, synchronous critical sections and may be called
/// from async handlers directly.
pub trait RevisionStore: Send + Sync {
    /// Insert a new revision. Fails with `Integrity` if the id is taken.
    fn store(&self, revision: TransformationRevision) -> Result<(), RevisionStoreError>;

    fn read(&self, id: TransformationRevisionId) -> Result<TransformationRevision, RevisionStoreError>;

    /// Replace an existing revision (subject to model rules) or insert it.
    fn update_or_create(
        &self,
        revision: TransformationRevision,
        options: UpdateOptions,
    ) -> Result<TransformationRevision, RevisionStoreError>;

    /// Delete a revision. Only DRAFT revisions unless `ignore_state` is set.
    fn delete(&self, id: TransformationRevisionId, ignore_state: bool) -> Result<(), RevisionStoreError>;

    /// Matching revisions ordered by name, then version tag.
    fn list(&self, filter: &RevisionFilter) -> Result<Vec<TransformationRevision>, RevisionStoreError>;

    /// Id of the most recently released RELEASED revision of a group.
    fn latest_released_id(
        &self,
        group: RevisionGroupId,
    ) -> Result<TransformationRevisionId, RevisionStoreError>;
}
