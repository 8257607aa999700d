//! Transformation revision model (components and workflows).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::id::{RevisionGroupId, TransformationRevisionId};
use crate::wiring::WorkflowWiring;

/// Lifecycle state of a revision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    Draft,
    Released,
    Disabled,
}

/// Kind of transformation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Type {
    Component,
    Workflow,
}

/// Declared input or output port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoDescriptor {
    #[serde(default = "Uuid::now_v7")]
    pub id: Uuid,
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IoInterface {
    #[serde(default)]
    pub inputs: Vec<IoDescriptor>,
    #[serde(default)]
    pub outputs: Vec<IoDescriptor>,
}

/// One versioned component or workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRevision {
    pub id: TransformationRevisionId,
    pub revision_group_id: RevisionGroupId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub version_tag: String,
    #[serde(rename = "type")]
    pub kind: Type,
    pub state: State,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub io_interface: IoInterface,
    /// Component code or workflow structure; opaque at this layer.
    #[serde(default)]
    pub content: JsonValue,
    #[serde(default)]
    pub test_wiring: WorkflowWiring,
}

impl TransformationRevision {
    /// Check timestamp/state consistency.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        match self.state {
            State::Released if self.released_timestamp.is_none() => Err(DomainError::validation(
                "released revision requires released_timestamp",
            )),
            State::Disabled if self.disabled_timestamp.is_none() => Err(DomainError::validation(
                "disabled revision requires disabled_timestamp",
            )),
            _ => Ok(()),
        }
    }

    /// Move a DRAFT revision to RELEASED.
    pub fn release(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.state != State::Draft {
            return Err(DomainError::constraint(format!(
                "only DRAFT revisions can be released, {} is {:?}",
                self.id, self.state
            )));
        }
        self.state = State::Released;
        self.released_timestamp = Some(at);
        Ok(())
    }

    /// Move a RELEASED revision to DISABLED.
    pub fn deprecate(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.state != State::Released {
            return Err(DomainError::constraint(format!(
                "only RELEASED revisions can be disabled, {} is {:?}",
                self.id, self.state
            )));
        }
        self.state = State::Disabled;
        self.disabled_timestamp = Some(at);
        Ok(())
    }

    /// Decide whether `updated` may replace `self`.
    ///
    /// DRAFT revisions are freely modifiable. A RELEASED revision may only be
    /// disabled, unless `allow_overwrite_released` is set. The type never changes.
    pub fn check_replacement(
        &self,
        updated: &TransformationRevision,
        allow_overwrite_released: bool,
    ) -> DomainResult<()> {
        if self.kind != updated.kind {
            return Err(DomainError::constraint(format!(
                "type of {} cannot change from {:?} to {:?}",
                self.id, self.kind, updated.kind
            )));
        }
        if allow_overwrite_released {
            return Ok(());
        }
        match (self.state, updated.state) {
            (State::Draft, _) => Ok(()),
            (State::Released, State::Disabled) => Ok(()),
            (from, to) => Err(DomainError::constraint(format!(
                "revision {} in state {:?} cannot be updated to {:?}",
                self.id, from, to
            ))),
        }
    }
}
