//! Configuration loader for the `codemetal-tankflow` backend service.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). By consolidating configuration logic
//! here, we avoid scattering `env::var` calls throughout the codebase.

use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::FixedOffset;

// ---

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional float environment variable with a default value.
macro_rules! parse_env_f64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional signed integer environment variable with a default.
macro_rules! parse_env_i32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<i32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

// ---

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Fixed operations address notified on every alert.
    pub ops_alert_email: String,

    /// Alert relay endpoint; notifications are disabled when unset.
    pub alert_webhook_url: Option<String>,

    /// Whether the simulated ingestion scheduler runs.
    pub simulator_enabled: bool,

    /// Cadence of simulated level readings.
    pub level_interval: Duration,

    /// Cadence of simulated quality readings.
    pub quality_interval: Duration,

    /// Cadence of tank working-set refreshes.
    pub tank_refresh_interval: Duration,

    /// Billing rate per 1000-liter unit.
    pub rate_per_unit: f64,

    /// Fixed UTC offset, in minutes, under which calendar days are taken
    /// for aggregation and billing. Zero means plain UTC.
    pub agg_utc_offset_minutes: i32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `OPS_ALERT_EMAIL` – operations alert address (default: ops@tankflow.local)
/// - `ALERT_WEBHOOK_URL` – alert relay endpoint (default: unset, disabled)
/// - `SIMULATOR_ENABLED` – run the simulated feed (default: true)
/// - `LEVEL_INTERVAL_SECS` – level reading cadence (default: 60)
/// - `QUALITY_INTERVAL_SECS` – quality reading cadence (default: 300)
/// - `TANK_REFRESH_SECS` – tank list refresh cadence (default: 300)
/// - `BILLING_RATE_PER_UNIT` – rate per 1000 L unit (default: 20.0)
/// - `AGG_UTC_OFFSET_MINUTES` – aggregation day offset from UTC (default: 0)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u64!("DB_POOL_MAX", 5) as u32;

    let ops_alert_email =
        env::var("OPS_ALERT_EMAIL").unwrap_or_else(|_| "ops@tankflow.local".to_string());
    let alert_webhook_url = env::var("ALERT_WEBHOOK_URL").ok().filter(|v| !v.is_empty());

    let simulator_enabled = match env::var("SIMULATOR_ENABLED").as_deref() {
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => true,
    };

    let level_interval = Duration::from_secs(parse_env_u64!("LEVEL_INTERVAL_SECS", 60));
    let quality_interval = Duration::from_secs(parse_env_u64!("QUALITY_INTERVAL_SECS", 300));
    let tank_refresh_interval = Duration::from_secs(parse_env_u64!("TANK_REFRESH_SECS", 300));

    let rate_per_unit = parse_env_f64!("BILLING_RATE_PER_UNIT", 20.0);
    let agg_utc_offset_minutes = parse_env_i32!("AGG_UTC_OFFSET_MINUTES", 0);
    if agg_utc_offset_minutes.abs() >= 24 * 60 {
        return Err(anyhow!(
            "AGG_UTC_OFFSET_MINUTES must be within +-1440, got {}",
            agg_utc_offset_minutes
        ));
    }

    Ok(Config {
        db_url,
        db_pool_max,
        ops_alert_email,
        alert_webhook_url,
        simulator_enabled,
        level_interval,
        quality_interval,
        tank_refresh_interval,
        rate_per_unit,
        agg_utc_offset_minutes,
    })
}

impl Config {
    /// The aggregation offset as a chrono [`FixedOffset`].
    pub fn agg_offset(&self) -> FixedOffset {
        // Bounds were validated at load time.
        FixedOffset::east_opt(self.agg_utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        // Mask the password in the database URL for security
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL           : {}", masked_db_url);
        tracing::info!("  DB_POOL_MAX            : {}", self.db_pool_max);
        tracing::info!("  OPS_ALERT_EMAIL        : {}", self.ops_alert_email);
        tracing::info!(
            "  ALERT_WEBHOOK_URL      : {}",
            self.alert_webhook_url.as_deref().unwrap_or("(disabled)")
        );
        tracing::info!("  SIMULATOR_ENABLED      : {}", self.simulator_enabled);
        tracing::info!("  LEVEL_INTERVAL_SECS    : {}", self.level_interval.as_secs());
        tracing::info!(
            "  QUALITY_INTERVAL_SECS  : {}",
            self.quality_interval.as_secs()
        );
        tracing::info!(
            "  TANK_REFRESH_SECS      : {}",
            self.tank_refresh_interval.as_secs()
        );
        tracing::info!("  BILLING_RATE_PER_UNIT  : {}", self.rate_per_unit);
        tracing::info!(
            "  AGG_UTC_OFFSET_MINUTES : {}",
            self.agg_utc_offset_minutes
        );
    }
}
