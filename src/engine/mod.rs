//! The telemetry engine: threshold evaluation, alert dispatch, daily
//! aggregation, and billing.
//!
//! This is the one shared implementation of the rules that the product's
//! handlers and dashboards all consume. Gateway module (EMBP): submodules
//! stay private, the engine surface is re-exported here.

mod aggregate;
mod billing;
mod dispatch;
mod evaluate;
mod ingest;

// ---

pub use aggregate::{aggregate, REFILL_LEVEL_RATIO};
pub use billing::{bill, month_bounds, previous_month_bounds};
pub use dispatch::{dispatch, DispatchFailure, DispatchResult};
pub use evaluate::{evaluate, AlertDecision, Severity, LOW_LEVEL_PERCENT};
pub use ingest::{ingest_reading, IngestReport};
