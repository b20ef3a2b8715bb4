use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{EntityStore, TableEntity};
use crate::error::AppError;
use crate::infra::repositories::{
    postgres_table_store::PostgresTableStore, sqlite_table_store::SqliteTableStore, timed_store::TimedStore,
};
use crate::state::{AppState, Stores};

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let database_url = &config.database_url;

    let stores = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let opts: PgConnectOptions = database_url.parse()?;
        let opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await?;

        run_postgres_migrations(&pool).await?;
        postgres_stores(&pool, config.store_timeout)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let pool = connect_sqlite(database_url).await?;
        run_sqlite_migrations(&pool).await?;
        sqlite_stores(&pool, config.store_timeout)
    };

    Ok(AppState::new(config.clone(), stores))
}

pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

fn timed<T: TableEntity>(inner: Arc<dyn EntityStore<T>>, limit: Duration) -> Arc<dyn EntityStore<T>> {
    Arc::new(TimedStore::new(inner, limit))
}

pub fn sqlite_stores(pool: &SqlitePool, limit: Duration) -> Stores {
    fn store<T: TableEntity>(pool: &SqlitePool, limit: Duration) -> Arc<dyn EntityStore<T>> {
        timed(Arc::new(SqliteTableStore::<T>::new(pool.clone())), limit)
    }

    Stores {
        users: store(pool, limit),
        providers: store(pool, limit),
        services: store(pool, limit),
        staff: store(pool, limit),
        schedules: store(pool, limit),
        blocked_dates: store(pool, limit),
        bookings: store(pool, limit),
        idempotency: store(pool, limit),
    }
}

pub fn postgres_stores(pool: &PgPool, limit: Duration) -> Stores {
    fn store<T: TableEntity>(pool: &PgPool, limit: Duration) -> Arc<dyn EntityStore<T>> {
        timed(Arc::new(PostgresTableStore::<T>::new(pool.clone())), limit)
    }

    Stores {
        users: store(pool, limit),
        providers: store(pool, limit),
        services: store(pool, limit),
        staff: store(pool, limit),
        schedules: store(pool, limit),
        blocked_dates: store(pool, limit),
        bookings: store(pool, limit),
        idempotency: store(pool, limit),
    }
}

async fn run_postgres_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .map_err(|e| AppError::Store(format!("Failed to run Postgres migrations: {}", e)))
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .map_err(|e| AppError::Store(format!("Failed to run SQLite migrations: {}", e)))
}
