//! Rostra conversion scheduler runtime.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, Utc};
use rostra_application::ConversionService;
use rostra_core::{AppError, AppResult};
use rostra_infrastructure::{
    PostgresAuditRepository, PostgresRoleRecordStore, TracingLifecycleHooks,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct SchedulerConfig {
    database_url: String,
    poll_interval_ms: u64,
    utc_offset_hours: i32,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = SchedulerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let conversion_service = build_conversion_service(pool);

    info!(
        poll_interval_ms = config.poll_interval_ms,
        utc_offset_hours = config.utc_offset_hours,
        "rostra-scheduler started"
    );

    loop {
        let today = local_today(config.utc_offset_hours);

        match conversion_service.due_for_conversion(today).await {
            Ok(due) => {
                if !due.is_empty() {
                    info!(as_of = %today, due_count = due.len(), "found scheduled roles due for conversion");
                }

                for record in due {
                    let id = record.id;
                    match conversion_service.convert(id).await {
                        Ok(active) => {
                            info!(
                                role_assignment_id = %id,
                                replacement_id = %active.id,
                                role = %active.describe(),
                                "scheduled role converted"
                            );
                        }
                        Err(error) => {
                            warn!(
                                role_assignment_id = %id,
                                error = %error,
                                "scheduled role conversion failed"
                            );
                        }
                    }
                }
            }
            Err(error) => {
                warn!(as_of = %today, error = %error, "failed to enumerate due scheduled roles");
            }
        }

        tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_conversion_service(pool: PgPool) -> ConversionService {
    let store = Arc::new(PostgresRoleRecordStore::new(
        pool.clone(),
        Arc::new(TracingLifecycleHooks),
    ));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool));

    ConversionService::new(store, audit_repository)
}

fn local_today(utc_offset_hours: i32) -> NaiveDate {
    match FixedOffset::east_opt(utc_offset_hours * 3600) {
        Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
        None => Utc::now().date_naive(),
    }
}

impl SchedulerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let poll_interval_ms = parse_env_u64("SCHEDULER_POLL_INTERVAL_MS", 60_000)?;
        let utc_offset_hours = parse_env_i32("SCHEDULER_UTC_OFFSET_HOURS", 0)?;

        if poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "SCHEDULER_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        if !(-12..=14).contains(&utc_offset_hours) {
            return Err(AppError::Validation(
                "SCHEDULER_UTC_OFFSET_HOURS must be between -12 and 14".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            poll_interval_ms,
            utc_offset_hours,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_i32(name: &str, default: i32) -> AppResult<i32> {
    match env::var(name) {
        Ok(value) => value.parse::<i32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
