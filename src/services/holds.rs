//! Временные удержания мест (hold) на время оформления.
//!
//! Место, выбранное в сессии, удерживается за ней на `ttl`. Пока удержание
//! живо, другие сессии видят место как `reserved`. Удержание снимается
//! явно (отмена выбора, сброс, оформление) или истекает само.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AppResult;
use crate::models::LayoutScope;

/// Note: методы возвращают `BoxFuture`, чтобы трейт оставался dyn-compatible.
pub trait HoldStore: Send + Sync {
    /// Атомарно занять место. `false`, если оно уже удержано другим
    fn claim<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_id: &'a str,
        holder: &'a str,
        ttl: Duration,
    ) -> BoxFuture<'a, AppResult<bool>>;

    /// Снять удержание. Снимает только владелец
    fn release<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_id: &'a str,
        holder: &'a str,
    ) -> BoxFuture<'a, AppResult<bool>>;

    /// Текущие владельцы удержаний: seat_id -> holder
    fn holders<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_ids: &'a [String],
    ) -> BoxFuture<'a, AppResult<HashMap<String, String>>>;
}

#[derive(Debug)]
struct Hold {
    holder: String,
    expires_at: Instant,
}

/// Удержания в памяти процесса (dev-режим и тесты)
#[derive(Debug, Default)]
pub struct MemoryHoldStore {
    holds: Mutex<HashMap<(LayoutScope, String), Hold>>,
}

impl MemoryHoldStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HoldStore for MemoryHoldStore {
    fn claim<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_id: &'a str,
        holder: &'a str,
        ttl: Duration,
    ) -> BoxFuture<'a, AppResult<bool>> {
        Box::pin(async move {
            let now = Instant::now();
            let mut holds = self.holds.lock().await;
            let key = (scope.clone(), seat_id.to_string());

            if let Some(existing) = holds.get(&key) {
                if existing.expires_at > now && existing.holder != holder {
                    return Ok(false);
                }
            }
            holds.insert(key, Hold { holder: holder.to_string(), expires_at: now + ttl });
            Ok(true)
        })
    }

    fn release<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_id: &'a str,
        holder: &'a str,
    ) -> BoxFuture<'a, AppResult<bool>> {
        Box::pin(async move {
            let mut holds = self.holds.lock().await;
            let key = (scope.clone(), seat_id.to_string());
            match holds.get(&key) {
                Some(hold) if hold.holder == holder => {
                    holds.remove(&key);
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn holders<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_ids: &'a [String],
    ) -> BoxFuture<'a, AppResult<HashMap<String, String>>> {
        Box::pin(async move {
            let now = Instant::now();
            let mut holds = self.holds.lock().await;
            holds.retain(|_, hold| hold.expires_at > now);

            Ok(seat_ids
                .iter()
                .filter_map(|id| {
                    holds
                        .get(&(scope.clone(), id.clone()))
                        .map(|hold| (id.clone(), hold.holder.clone()))
                })
                .collect())
        })
    }
}
