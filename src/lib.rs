//! `codemetal-tankflow` — telemetry, alerting, and billing engine for the
//! water-tank monitoring service.
//!
//! The crate is split along collaborator boundaries (EMBP):
//! - `engine` — the one shared implementation of threshold evaluation,
//!   alert dispatch, daily aggregation, and billing
//! - `store` / `notify` — collaborator contracts plus their production
//!   implementations (PostgreSQL, webhook relay)
//! - `scheduler` + `sim` — the periodic simulated telemetry feed
//! - `routes` — thin HTTP glue over the engine
//! - `config` / `schema` / `error` — runtime configuration, DDL, and the
//!   engine error taxonomy
//!
//! The binary in `main.rs` wires these together; tests drive the same
//! public surface with in-memory collaborators.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod notify;
pub mod routes;
pub mod scheduler;
pub mod schema;
pub mod sim;
pub mod store;

// ---

pub use config::Config;
pub use error::EngineError;
pub use models::{
    AlertEvent, BillingPeriod, DailyAggregate, QualityStatus, RawLevelReading, RawQualityReading,
    Reading, ReadingKind, Tank,
};
pub use notify::{AlertNotifier, Notifier, WebhookNotifier};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use store::{PgStore, ReadingStore};
