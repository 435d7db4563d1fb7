pub mod config;
pub mod error;
pub mod database;
pub mod redis_client;
pub mod models;
pub mod controllers;
pub mod cache;
pub mod services;

use std::sync::Arc;
use tracing::{info, warn};

use error::AppError;
use models::Catalog;
use services::holds::{HoldStore, MemoryHoldStore};
use services::reservations::{MemoryReservationStore, PgReservationStore, ReservationStore};
use services::sessions::SessionManager;

// Shared state для всего приложения
pub struct AppState {
    pub config: config::Config,
    pub db: Option<database::Database>,
    pub sessions: SessionManager,
}

impl AppState {
    /// Подключает Postgres/Redis, если они заданы, иначе работает в памяти
    pub async fn new(config: config::Config) -> Result<Arc<Self>, AppError> {
        let catalog = match &config.booking.catalog_path {
            Some(path) => {
                let catalog = Catalog::load(path).map_err(|e| AppError::Config(e.to_string()))?;
                info!("Catalog loaded from {}", path);
                catalog
            }
            None => Catalog::builtin(),
        };

        let (db, reservations) = match &config.database {
            Some(cfg) => {
                let db = database::Database::connect(cfg).await?;
                db.run_migrations()
                    .await
                    .map_err(|e| AppError::Config(format!("migrations failed: {}", e)))?;
                info!("Database connected");
                (Some(db.clone()), Arc::new(PgReservationStore::new(db)) as Arc<dyn ReservationStore>)
            }
            None => {
                warn!("DATABASE_URL not set, reservations are kept in memory");
                (None, Arc::new(MemoryReservationStore::new()) as Arc<dyn ReservationStore>)
            }
        };

        let holds: Arc<dyn HoldStore> = match &config.redis {
            Some(cfg) => {
                let redis = redis_client::RedisClient::new(&cfg.url).await?;
                let cache = cache::CacheService::new(redis);
                cache.ping().await?;
                info!("Redis connected");
                Arc::new(cache)
            }
            None => {
                warn!("REDIS_URL not set, seat holds are kept in memory");
                Arc::new(MemoryHoldStore::new())
            }
        };

        Ok(Self::with_backends(config, catalog, db, reservations, holds))
    }

    pub fn with_backends(
        config: config::Config,
        catalog: Catalog,
        db: Option<database::Database>,
        reservations: Arc<dyn ReservationStore>,
        holds: Arc<dyn HoldStore>,
    ) -> Arc<Self> {
        let sessions = SessionManager::new(
            Arc::new(catalog),
            reservations,
            holds,
            config.booking.session_settings(),
        );
        Arc::new(Self { config, db, sessions })
    }

    /// Всё в памяти: dev-режим и тесты
    pub fn in_memory(config: config::Config) -> Arc<Self> {
        Self::with_backends(
            config,
            Catalog::builtin(),
            None,
            Arc::new(MemoryReservationStore::new()),
            Arc::new(MemoryHoldStore::new()),
        )
    }
}
