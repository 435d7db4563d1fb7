//! Подтверждённые брони мест.
//!
//! Источник правды о проданных местах. Двойную продажу предотвращает
//! уникальный ключ (layout_key, travel_date, seat_id): claim либо вставляет
//! все места брони, либо ни одного.

use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::database::Database;
use crate::error::AppResult;
use crate::models::LayoutScope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResult {
    Claimed,
    /// Эти места уже проданы, ничего не записано
    Conflict(Vec<String>),
}

/// Note: `BoxFuture` вместо async fn, чтобы трейт оставался dyn-compatible.
pub trait ReservationStore: Send + Sync {
    fn occupied<'a>(&'a self, scope: &'a LayoutScope) -> BoxFuture<'a, AppResult<HashSet<String>>>;

    fn claim<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_ids: &'a [String],
        booking_ref: &'a str,
    ) -> BoxFuture<'a, AppResult<ClaimResult>>;

    fn release<'a>(&'a self, scope: &'a LayoutScope, booking_ref: &'a str) -> BoxFuture<'a, AppResult<u64>>;
}

/* ---------- Postgres ---------- */

#[derive(Clone)]
pub struct PgReservationStore {
    db: Database,
}

impl PgReservationStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl ReservationStore for PgReservationStore {
    fn occupied<'a>(&'a self, scope: &'a LayoutScope) -> BoxFuture<'a, AppResult<HashSet<String>>> {
        Box::pin(async move {
            let ids: Vec<String> = sqlx::query_scalar(
                "SELECT seat_id FROM seat_reservations WHERE layout_key = $1 AND travel_date = $2"
            )
            .bind(&scope.layout_key)
            .bind(scope.date)
            .fetch_all(&self.db.pool)
            .await?;
            Ok(ids.into_iter().collect())
        })
    }

    fn claim<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_ids: &'a [String],
        booking_ref: &'a str,
    ) -> BoxFuture<'a, AppResult<ClaimResult>> {
        Box::pin(async move {
            let mut tx = self.db.pool.begin().await?;

            let inserted: Vec<String> = sqlx::query_scalar(
                r#"
                INSERT INTO seat_reservations (layout_key, travel_date, seat_id, booking_ref)
                SELECT $1, $2, seat_id, $4
                FROM UNNEST($3::TEXT[]) AS t(seat_id)
                ON CONFLICT (layout_key, travel_date, seat_id) DO NOTHING
                RETURNING seat_id
                "#
            )
            .bind(&scope.layout_key)
            .bind(scope.date)
            .bind(seat_ids)
            .bind(booking_ref)
            .fetch_all(&mut *tx)
            .await?;

            if inserted.len() < seat_ids.len() {
                // часть мест уже продана - откатываем всю бронь
                let _ = tx.rollback().await;
                let inserted: HashSet<&String> = inserted.iter().collect();
                let taken: Vec<String> = seat_ids
                    .iter()
                    .filter(|id| !inserted.contains(id))
                    .cloned()
                    .collect();
                warn!("Claim {} on {} conflicted on {:?}", booking_ref, scope, taken);
                return Ok(ClaimResult::Conflict(taken));
            }

            tx.commit().await?;
            info!("Booking {} confirmed {} seats on {}", booking_ref, inserted.len(), scope);
            Ok(ClaimResult::Claimed)
        })
    }

    fn release<'a>(&'a self, scope: &'a LayoutScope, booking_ref: &'a str) -> BoxFuture<'a, AppResult<u64>> {
        Box::pin(async move {
            let result = sqlx::query(
                "DELETE FROM seat_reservations WHERE layout_key = $1 AND travel_date = $2 AND booking_ref = $3"
            )
            .bind(&scope.layout_key)
            .bind(scope.date)
            .bind(booking_ref)
            .execute(&self.db.pool)
            .await?;
            Ok(result.rows_affected())
        })
    }
}

/* ---------- In-memory ---------- */

#[derive(Debug, Default)]
pub struct MemoryReservationStore {
    // scope -> seat_id -> booking_ref
    seats: Mutex<HashMap<LayoutScope, HashMap<String, String>>>,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReservationStore for MemoryReservationStore {
    fn occupied<'a>(&'a self, scope: &'a LayoutScope) -> BoxFuture<'a, AppResult<HashSet<String>>> {
        Box::pin(async move {
            let seats = self.seats.lock().await;
            Ok(seats
                .get(scope)
                .map(|taken| taken.keys().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn claim<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_ids: &'a [String],
        booking_ref: &'a str,
    ) -> BoxFuture<'a, AppResult<ClaimResult>> {
        Box::pin(async move {
            let mut seats = self.seats.lock().await;
            let taken = seats.entry(scope.clone()).or_default();

            let conflicts: Vec<String> = seat_ids
                .iter()
                .filter(|id| taken.contains_key(*id))
                .cloned()
                .collect();
            if !conflicts.is_empty() {
                return Ok(ClaimResult::Conflict(conflicts));
            }

            for id in seat_ids {
                taken.insert(id.clone(), booking_ref.to_string());
            }
            Ok(ClaimResult::Claimed)
        })
    }

    fn release<'a>(&'a self, scope: &'a LayoutScope, booking_ref: &'a str) -> BoxFuture<'a, AppResult<u64>> {
        Box::pin(async move {
            let mut seats = self.seats.lock().await;
            let Some(taken) = seats.get_mut(scope) else {
                return Ok(0);
            };
            let before = taken.len();
            taken.retain(|_, r| r != booking_ref);
            Ok((before - taken.len()) as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn scope() -> LayoutScope {
        LayoutScope::new("teatro-municipal", NaiveDate::from_ymd_opt(2025, 9, 20).unwrap())
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn claim_is_all_or_nothing() {
        let store = MemoryReservationStore::new();
        let first = ids(&["palco-R1-S1", "palco-R1-S2"]);
        assert_eq!(store.claim(&scope(), &first, "b-1").await.unwrap(), ClaimResult::Claimed);

        let second = ids(&["palco-R1-S2", "palco-R1-S3"]);
        assert_eq!(
            store.claim(&scope(), &second, "b-2").await.unwrap(),
            ClaimResult::Conflict(ids(&["palco-R1-S2"]))
        );

        let occupied = store.occupied(&scope()).await.unwrap();
        assert_eq!(occupied.len(), 2);
        assert!(!occupied.contains("palco-R1-S3"));
    }

    #[tokio::test]
    async fn release_frees_only_that_booking() {
        let store = MemoryReservationStore::new();
        store.claim(&scope(), &ids(&["a"]), "b-1").await.unwrap();
        store.claim(&scope(), &ids(&["b", "c"]), "b-2").await.unwrap();

        assert_eq!(store.release(&scope(), "b-2").await.unwrap(), 2);
        assert_eq!(store.occupied(&scope()).await.unwrap(), ["a".to_string()].into_iter().collect());
        assert_eq!(store.release(&scope(), "missing").await.unwrap(), 0);
    }
}
