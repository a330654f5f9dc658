//! Reading ingestion scheduler.
//!
//! Drives the simulated telemetry feed: on independent cadences it produces
//! one level reading per tank, one quality reading per tank, and refreshes
//! the working tank list from the registry. All produced readings flow
//! through [`crate::engine::ingest_reading`], the same pipeline the HTTP
//! ingestion handlers use.
//!
//! The scheduler owns its mutable state — the tank snapshot and the
//! per-tank last-known level — so multiple instances (one per test, say)
//! never interfere. It stops when the paired [`watch`] sender signals
//! shutdown, a deliberate improvement over an unstoppable loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::interval;

use crate::engine::ingest_reading;
use crate::models::{Reading, Tank};
use crate::notify::Notifier;
use crate::sim;
use crate::store::ReadingStore;

// ---

/// Cadences and addressing for one scheduler instance.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    // ---
    /// Cadence of simulated level readings.
    pub level_interval: Duration,
    /// Cadence of simulated quality readings; coarser than level in
    /// production, but that is configuration, not a constraint.
    pub quality_interval: Duration,
    /// How often the tank working set is refreshed from the registry. A
    /// stale list for up to one cycle is acceptable.
    pub tank_refresh_interval: Duration,
    /// Fixed operations address included on every alert.
    pub ops_address: String,
}

/// Periodic producer of simulated tank readings.
pub struct Scheduler<S, N> {
    // ---
    store: Arc<S>,
    notifier: Arc<N>,
    config: SchedulerConfig,
    /// Snapshot of the tank registry, refreshed on its own cadence.
    tanks: Vec<Tank>,
    /// Last simulated level per tank id, carried tick to tick.
    last_levels: HashMap<String, f32>,
}

impl<S, N> Scheduler<S, N>
where
    S: ReadingStore + 'static,
    N: Notifier + 'static,
{
    // ---
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: SchedulerConfig) -> Self {
        Scheduler {
            store,
            notifier,
            config,
            tanks: Vec::new(),
            last_levels: HashMap::new(),
        }
    }

    /// Run until the stop channel signals shutdown.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        // ---
        tracing::info!(
            level_interval_secs = self.config.level_interval.as_secs(),
            quality_interval_secs = self.config.quality_interval.as_secs(),
            tank_refresh_secs = self.config.tank_refresh_interval.as_secs(),
            "ingestion scheduler starting"
        );

        if let Err(e) = self.refresh_tanks().await {
            tracing::warn!(error = %e, "initial tank refresh failed; starting with empty set");
        }

        let mut level_tick = interval(self.config.level_interval);
        let mut quality_tick = interval(self.config.quality_interval);
        let mut refresh_tick = interval(self.config.tank_refresh_interval);
        // The first tick of a fresh interval completes immediately; that
        // gives one reading per tank right at startup.

        loop {
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        tracing::info!("ingestion scheduler stopping");
                        break;
                    }
                }
                _ = refresh_tick.tick() => {
                    if let Err(e) = self.refresh_tanks().await {
                        tracing::warn!(error = %e, "tank refresh failed; keeping stale set");
                    }
                }
                _ = level_tick.tick() => self.tick_level().await,
                _ = quality_tick.tick() => self.tick_quality().await,
            }
        }
    }

    /// Replace the tank working set from the registry.
    pub async fn refresh_tanks(&mut self) -> Result<(), crate::error::EngineError> {
        // ---
        self.tanks = self.store.query_tanks().await?;
        tracing::debug!(tank_count = self.tanks.len(), "tank working set refreshed");
        Ok(())
    }

    /// Produce one level reading for every known tank.
    pub async fn tick_level(&mut self) {
        // ---
        let now = Utc::now();
        let mut batch: Vec<(Tank, Reading)> = Vec::with_capacity(self.tanks.len());
        {
            let mut rng = rand::thread_rng();
            for tank in &self.tanks {
                if !tank.capacity_liters.is_finite() || tank.capacity_liters <= 0.0 {
                    tracing::warn!(
                        tank_id = %tank.tank_id,
                        capacity = %tank.capacity_liters,
                        "skipping tank with unusable capacity"
                    );
                    continue;
                }
                let previous = self.last_levels.get(&tank.tank_id).copied();
                let level = sim::next_level(&mut rng, tank.capacity_liters, previous);
                self.last_levels.insert(tank.tank_id.clone(), level);
                batch.push((tank.clone(), sim::level_reading(tank, level, now)));
            }
        }

        self.process_batch(batch).await;
    }

    /// Produce one quality reading for every known tank.
    pub async fn tick_quality(&mut self) {
        // ---
        let now = Utc::now();
        let mut batch: Vec<(Tank, Reading)> = Vec::with_capacity(self.tanks.len());
        {
            let mut rng = rand::thread_rng();
            for tank in &self.tanks {
                let (ph_level, tds, status) = sim::next_quality(&mut rng);
                batch.push((
                    tank.clone(),
                    sim::quality_reading(tank, ph_level, tds, status, now),
                ));
            }
        }

        self.process_batch(batch).await;
    }

    /// Run one tick's readings through the ingestion pipeline, one task per
    /// tank. Tanks are independent: a store or notify failure for one is
    /// logged and never aborts the others.
    async fn process_batch(&self, batch: Vec<(Tank, Reading)>) {
        // ---
        let mut handles = Vec::with_capacity(batch.len());
        for (tank, reading) in batch {
            let store = Arc::clone(&self.store);
            let notifier = Arc::clone(&self.notifier);
            let ops_address = self.config.ops_address.clone();
            handles.push(tokio::spawn(async move {
                if let Err(e) =
                    ingest_reading(store.as_ref(), notifier.as_ref(), &tank, reading, &ops_address)
                        .await
                {
                    tracing::warn!(
                        tank_id = %tank.tank_id,
                        error = %e,
                        "tick processing failed for tank"
                    );
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "tick task panicked");
            }
        }
    }
}
