//! Pluggable reporting for failures the alert store swallows.

use std::error::Error;

/// Receives store failures that were absorbed instead of propagated.
///
/// `operation` names the store call (`"get"`, `"set"`, ...); `context`
/// carries identifying fields such as the record key.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, operation: &str, error: &dyn Error, context: &serde_json::Value);
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn report(&self, _operation: &str, _error: &dyn Error, _context: &serde_json::Value) {}
}

/// Forwards reports to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, operation: &str, error: &dyn Error, context: &serde_json::Value) {
        tracing::warn!(
            operation = %operation,
            error = %error,
            context = %context,
            "Alert store operation failed"
        );
    }
}
