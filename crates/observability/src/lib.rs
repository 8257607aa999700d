//! Tracing and logging setup shared by the service binaries.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    crate::tracing::init();
}

/// Tracing configuration (filters, output format).
pub mod tracing;
