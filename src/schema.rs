//! Database schema management for `codemetal-tankflow`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `tanks` registry and the `tank_readings` telemetry table.
/// Safe to call on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Tank registry; rows are created by the registration route and treated
    // as read-only by the engine.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tanks (
            tank_id         TEXT PRIMARY KEY,
            capacity_liters REAL NOT NULL,
            contact_email   TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Telemetry, both kinds in one table; kind-specific columns are NULL
    // for the other kind.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tank_readings (
            id                SERIAL PRIMARY KEY,
            tank_id           TEXT        NOT NULL,
            kind              TEXT        NOT NULL,
            current_level     REAL,
            capacity_override REAL,
            ph_level          REAL,
            tds               REAL,
            status            TEXT,
            captured_at       TIMESTAMPTZ NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic indexes for the aggregation and billing queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_tank_readings_tank_kind
            ON tank_readings (tank_id, kind);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_tank_readings_captured_at
            ON tank_readings (captured_at);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
