use sqlx::{migrate::Migrator, postgres::PgPoolOptions, Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

static MIGRATOR: Migrator = sqlx::migrate!("./src/migrations");

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Пул Postgres для подтверждённых броней мест
#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

impl Database {
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.pool_size)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&cfg.url)
            .await?;

        info!("Postgres pool ready, up to {} connections", cfg.pool_size);
        Ok(Database { pool })
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Создаёт таблицу `seat_reservations`, если её ещё нет
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await?;
        info!("Seat reservation schema is up to date ({} migrations)", MIGRATOR.iter().count());
        Ok(())
    }
}
