//! Budget threshold alerting.
//!
//! This crate provides:
//! - `evaluate` threshold-crossing detector
//! - `MessageFormatter` rendering localized alert messages with minijinja
//! - `AlertStore` adapter persisting per-(budget, threshold) records over any
//!   `KeyValueStore`, reporting failures to a `DiagnosticSink`
//! - `AlertMonitor` state machine driving all of the above per spending update

pub mod diagnostics;
pub mod evaluator;
pub mod formatter;
pub mod monitor;
pub mod store;

pub use diagnostics::{DiagnosticSink, NoopSink, TracingSink};
pub use evaluator::evaluate;
pub use formatter::{format_message, MessageFormatter};
pub use monitor::{AlertMonitor, AlertState, FiredAlert, Severity};
pub use store::{AlertRecord, AlertStore};
