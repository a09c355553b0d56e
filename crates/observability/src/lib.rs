//! Tracing/logging setup shared by the console binary and tests.

/// Initialize process-wide logging with the format taken from
/// `WAREOPS_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::tracing::LogFormat;
