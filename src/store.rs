//! Reading storage: the engine's collaborator contract and its PostgreSQL
//! implementation.
//!
//! The engine only depends on [`ReadingStore`]; `PgStore` is the production
//! implementation, and tests substitute in-memory fakes. Tank registration
//! is product glue, so it lives on `PgStore` directly rather than on the
//! engine contract.

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::EngineError;
use crate::models::{Reading, ReadingKind, Tank};

// ---

/// Durable keyed storage for readings and the tank registry.
///
/// Concurrent writes for different tanks must not corrupt each other;
/// `query_readings` returns rows ordered by capture time even when inserts
/// arrived out of order.
pub trait ReadingStore: Send + Sync {
    fn write_reading(
        &self,
        reading: Reading,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn query_readings(
        &self,
        tank_id: &str,
        kind: ReadingKind,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> impl Future<Output = Result<Vec<Reading>, EngineError>> + Send;

    fn query_tanks(&self) -> impl Future<Output = Result<Vec<Tank>, EngineError>> + Send;

    fn find_tank(
        &self,
        tank_id: &str,
    ) -> impl Future<Output = Result<Option<Tank>, EngineError>> + Send;
}

// ---

/// Raw `tank_readings` row; converted into the domain [`Reading`].
#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    // ---
    tank_id: String,
    kind: String,
    current_level: Option<f32>,
    capacity_override: Option<f32>,
    ph_level: Option<f32>,
    tds: Option<f32>,
    status: Option<String>,
    captured_at: DateTime<Utc>,
}

impl ReadingRow {
    fn into_reading(self) -> Result<Reading, EngineError> {
        // ---
        Ok(Reading {
            tank_id: self.tank_id,
            kind: ReadingKind::parse(&self.kind)?,
            current_level: self.current_level,
            capacity_override: self.capacity_override,
            ph_level: self.ph_level,
            tds: self.tds,
            status: self.status,
            captured_at: self.captured_at,
        })
    }
}

/// PostgreSQL-backed store over the shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    // ---
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    /// Register a tank. Capacity and contact updates re-register under the
    /// same id.
    pub async fn insert_tank(&self, tank: &Tank) -> Result<(), EngineError> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO tanks (tank_id, capacity_liters, contact_email)
            VALUES ($1, $2, $3)
            ON CONFLICT (tank_id) DO UPDATE SET
                capacity_liters = EXCLUDED.capacity_liters,
                contact_email = EXCLUDED.contact_email
            "#,
        )
        .bind(&tank.tank_id)
        .bind(tank.capacity_liters)
        .bind(&tank.contact_email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl ReadingStore for PgStore {
    async fn write_reading(&self, reading: Reading) -> Result<(), EngineError> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO tank_readings (
                tank_id, kind, current_level, capacity_override,
                ph_level, tds, status, captured_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&reading.tank_id)
        .bind(reading.kind.as_str())
        .bind(reading.current_level)
        .bind(reading.capacity_override)
        .bind(reading.ph_level)
        .bind(reading.tds)
        .bind(&reading.status)
        .bind(reading.captured_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query_readings(
        &self,
        tank_id: &str,
        kind: ReadingKind,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Reading>, EngineError> {
        // ---
        let rows: Vec<ReadingRow> = match range {
            Some((from, to)) => {
                sqlx::query_as(
                    r#"
                    SELECT tank_id, kind, current_level, capacity_override,
                           ph_level, tds, status, captured_at
                    FROM tank_readings
                    WHERE tank_id = $1 AND kind = $2
                      AND captured_at >= $3 AND captured_at < $4
                    ORDER BY captured_at ASC
                    "#,
                )
                .bind(tank_id)
                .bind(kind.as_str())
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT tank_id, kind, current_level, capacity_override,
                           ph_level, tds, status, captured_at
                    FROM tank_readings
                    WHERE tank_id = $1 AND kind = $2
                    ORDER BY captured_at ASC
                    "#,
                )
                .bind(tank_id)
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(ReadingRow::into_reading).collect()
    }

    async fn query_tanks(&self) -> Result<Vec<Tank>, EngineError> {
        // ---
        let tanks: Vec<Tank> = sqlx::query_as(
            r#"
            SELECT tank_id, capacity_liters, contact_email
            FROM tanks
            ORDER BY tank_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tanks)
    }

    async fn find_tank(&self, tank_id: &str) -> Result<Option<Tank>, EngineError> {
        // ---
        let tank: Option<Tank> = sqlx::query_as(
            r#"
            SELECT tank_id, capacity_liters, contact_email
            FROM tanks
            WHERE tank_id = $1
            "#,
        )
        .bind(tank_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tank)
    }
}
