//! `trafo-core` — transformation revision building blocks.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! identifiers, the revision model and execution wirings.

pub mod error;
pub mod id;
pub mod revision;
pub mod wiring;

pub use error::{DomainError, DomainResult};
pub use id::{JobId, RevisionGroupId, TransformationRevisionId};
pub use revision::{IoDescriptor, IoInterface, State, TransformationRevision, Type};
pub use wiring::{InputWiring, OutputWiring, WorkflowWiring};
