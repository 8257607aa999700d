//! Outbound HTTP clients.

pub mod callback;
pub mod runtime;

pub use callback::{CallbackDispatcher, DeliveryReport};
pub use runtime::RemoteRuntimeEngine;
