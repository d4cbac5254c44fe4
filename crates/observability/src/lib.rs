//! Process-wide logging setup shared by warden hosts.

/// Initialize tracing/logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Same as [`init`] with an explicit fallback filter for when `RUST_LOG` is unset.
pub fn init_with_default(filter: &str) {
    tracing::init(filter);
}

/// Subscriber configuration (filters, formatting).
pub mod tracing;
