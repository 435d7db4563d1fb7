//! Сессии бронирования.
//!
//! Каждая сессия владеет своей [`SeatSelection`] для одной схемы на одну дату.
//! Выбор места сначала удерживает его в [`HoldStore`], оформление записывает
//! места в [`ReservationStore`]. Изменения выбора рассылаются подписчикам
//! через `broadcast`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Catalog, Layout, LayoutPreset, LayoutScope, Seat, SeatStatus, TopologyKind};
use crate::services::holds::HoldStore;
use crate::services::layout::LayoutGenerator;
use crate::services::occupancy::{DemoOccupancy, Layered, OccupiedSeats};
use crate::services::queries::{self, LayoutSummary};
use crate::services::reservations::{ClaimResult, ReservationStore};
use crate::services::selection::{SeatSelection, SelectionListener, ToggleOutcome};

const EVENTS_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub hold_ttl: Duration,
    pub session_ttl: Duration,
    /// Лимит для транспорта, если его не задали ни запрос, ни справочник
    pub default_max_seats: usize,
    /// Подмешивать детерминированную демо-занятость (стенды без реальных продаж)
    pub demo_occupancy: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            hold_ttl: Duration::from_secs(300),
            session_ttl: Duration::from_secs(900),
            default_max_seats: 8,
            demo_occupancy: false,
        }
    }
}

/// Событие для подписчиков сессии (WebSocket)
#[derive(Debug, Clone, Serialize)]
pub struct SelectionEvent {
    pub session_id: Uuid,
    pub selected: Vec<Seat>,
    pub total: f64,
}

struct BroadcastListener {
    session_id: Uuid,
    tx: broadcast::Sender<SelectionEvent>,
}

impl SelectionListener for BroadcastListener {
    fn on_selection_change(&self, selected: &[Seat]) {
        let event = SelectionEvent {
            session_id: self.session_id,
            selected: selected.to_vec(),
            total: queries::total_price(selected),
        };
        // нет подписчиков - не ошибка
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub layout_key: String,
    pub name: String,
    pub topology: TopologyKind,
    pub date: NaiveDate,
    pub max_seats: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub seats: Vec<Seat>,
    pub selected: Vec<String>,
    pub total: f64,
    pub summary: LayoutSummary,
}

/// То, что уходит во внешний checkout
#[derive(Debug, Clone, Serialize)]
pub struct BookingRequest {
    pub booking_ref: String,
    pub session_id: Uuid,
    pub layout_key: String,
    pub date: NaiveDate,
    pub seats: Vec<Seat>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutView {
    pub key: String,
    pub name: String,
    pub topology: TopologyKind,
    pub date: NaiveDate,
    pub seats: Vec<Seat>,
    pub summary: LayoutSummary,
}

struct BookingSession {
    id: Uuid,
    scope: LayoutScope,
    preset: LayoutPreset,
    selection: SeatSelection,
    events: broadcast::Sender<SelectionEvent>,
    created_at: DateTime<Utc>,
    last_seen: Instant,
    // seat_id -> момент, когда истекает удержание выбранного места
    hold_deadlines: HashMap<String, Instant>,
}

impl BookingSession {
    fn holder(&self) -> String {
        self.id.to_string()
    }

    /// Выбранные места с истёкшим удержанием выпадают из выбора
    fn drop_expired_holds(&mut self, now: Instant) -> AppResult<Vec<String>> {
        let expired: Vec<String> = self
            .hold_deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(seat_id, _)| seat_id.clone())
            .collect();

        for seat_id in &expired {
            self.hold_deadlines.remove(seat_id);
            if self.selection.seat(seat_id).map(|s| s.status) == Some(SeatStatus::Selected) {
                self.selection.apply_external_status(seat_id, SeatStatus::Available)?;
            }
        }
        Ok(expired)
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            layout_key: self.scope.layout_key.clone(),
            name: self.preset.name.clone(),
            topology: self.preset.topology,
            date: self.scope.date,
            max_seats: self.selection.max_seats(),
            created_at: self.created_at,
            seats: self.selection.seats().to_vec(),
            selected: self.selection.selected_ids().to_vec(),
            total: self.selection.total(),
            summary: queries::summarize(self.selection.seats()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleResult {
    pub outcome: ToggleOutcome,
    pub session: SessionSnapshot,
}

pub struct SessionManager {
    catalog: Arc<Catalog>,
    reservations: Arc<dyn ReservationStore>,
    holds: Arc<dyn HoldStore>,
    settings: SessionSettings,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<BookingSession>>>>,
}

impl SessionManager {
    pub fn new(
        catalog: Arc<Catalog>,
        reservations: Arc<dyn ReservationStore>,
        holds: Arc<dyn HoldStore>,
        settings: SessionSettings,
    ) -> Self {
        Self { catalog, reservations, holds, settings, sessions: RwLock::new(HashMap::new()) }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn preset(&self, layout_key: &str) -> AppResult<LayoutPreset> {
        self.catalog
            .find(layout_key)
            .ok_or_else(|| AppError::NotFound(format!("layout {}", layout_key)))
    }

    fn generate(&self, preset: &LayoutPreset, scope: &LayoutScope, occupancy: &OccupiedSeats) -> Layout {
        if self.settings.demo_occupancy {
            let demo = DemoOccupancy::for_topology(preset.key.as_str(), preset.topology);
            let layered = Layered(occupancy, demo);
            LayoutGenerator::new(&layered, scope.date).generate(preset.topology, &preset.config, preset.base_price)
        } else {
            LayoutGenerator::new(occupancy, scope.date).generate(preset.topology, &preset.config, preset.base_price)
        }
    }

    /// Схема с актуальной занятостью: проданные места + чужие удержания.
    /// Занятость запрашивается один раз на генерацию.
    async fn load_layout(&self, preset: &LayoutPreset, scope: &LayoutScope) -> AppResult<Layout> {
        let occupied = self.reservations.occupied(scope).await?;
        let mut occupancy = OccupiedSeats::new(occupied, Default::default());
        let layout = self.generate(preset, scope, &occupancy);

        let free: Vec<String> = layout
            .seats
            .iter()
            .filter(|s| s.is_available())
            .map(|s| s.id.clone())
            .collect();
        let held = self.holds.holders(scope, &free).await?;
        occupancy.reserved = held.into_keys().collect();

        if occupancy.reserved.is_empty() {
            return Ok(layout);
        }
        Ok(self.generate(preset, scope, &occupancy))
    }

    pub async fn layout_view(&self, layout_key: &str, date: NaiveDate) -> AppResult<LayoutView> {
        let preset = self.preset(layout_key)?;
        let scope = LayoutScope::new(layout_key, date);
        let layout = self.load_layout(&preset, &scope).await?;
        Ok(LayoutView {
            key: preset.key,
            name: preset.name,
            topology: preset.topology,
            date,
            summary: queries::summarize(&layout.seats),
            seats: layout.seats,
        })
    }

    pub async fn open(&self, layout_key: &str, date: NaiveDate, max_seats: Option<usize>) -> AppResult<SessionSnapshot> {
        let preset = self.preset(layout_key)?;
        let scope = LayoutScope::new(layout_key, date);
        let layout = self.load_layout(&preset, &scope).await?;

        let max_seats = max_seats.or(preset.max_seats).or_else(|| {
            (!preset.topology.is_venue()).then_some(self.settings.default_max_seats)
        });

        let id = Uuid::new_v4();
        let (tx, _) = broadcast::channel(EVENTS_CAPACITY);
        let mut selection = SeatSelection::new(layout, max_seats);
        selection.subscribe(BroadcastListener { session_id: id, tx: tx.clone() });

        let session = BookingSession {
            id,
            scope,
            preset,
            selection,
            events: tx,
            created_at: Utc::now(),
            last_seen: Instant::now(),
            hold_deadlines: HashMap::new(),
        };
        let snapshot = session.snapshot();

        self.sessions.write().await.insert(id, Arc::new(Mutex::new(session)));
        info!("Opened session {} for {} on {}", id, layout_key, date);
        Ok(snapshot)
    }

    async fn get(&self, id: Uuid) -> AppResult<Arc<Mutex<BookingSession>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))
    }

    pub async fn snapshot(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        self.touch(&mut session).await?;
        Ok(session.snapshot())
    }

    pub async fn toggle(&self, id: Uuid, seat_id: &str) -> AppResult<ToggleResult> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        self.touch(&mut session).await?;

        let status = session
            .selection
            .seat(seat_id)
            .map(|s| s.status)
            .ok_or_else(|| {
                warn!("Session {} toggled unknown seat {}", id, seat_id);
                AppError::NotFound(format!("seat {}", seat_id))
            })?;

        let holder = session.holder();
        let outcome = match status {
            SeatStatus::Available if !session.selection.is_full() => {
                let claimed = self
                    .holds
                    .claim(&session.scope, seat_id, &holder, self.settings.hold_ttl)
                    .await?;
                if claimed {
                    let deadline = Instant::now() + self.settings.hold_ttl;
                    session.hold_deadlines.insert(seat_id.to_string(), deadline);
                    session.selection.toggle(seat_id)?
                } else {
                    // место успели удержать в другой сессии
                    session.selection.apply_external_status(seat_id, SeatStatus::Reserved)?;
                    ToggleOutcome::Locked
                }
            }
            SeatStatus::Selected => {
                let outcome = session.selection.toggle(seat_id)?;
                session.hold_deadlines.remove(seat_id);
                self.holds.release(&session.scope, seat_id, &holder).await?;
                outcome
            }
            _ => session.selection.toggle(seat_id)?,
        };

        debug!("Session {} seat {} -> {:?}", id, seat_id, outcome);
        Ok(ToggleResult { outcome, session: session.snapshot() })
    }

    pub async fn reset(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        self.touch(&mut session).await?;

        let released = session.selection.selected_ids().to_vec();
        session.selection.reset();
        session.hold_deadlines.clear();
        self.release_holds(&session, &released).await;

        Ok(session.snapshot())
    }

    pub async fn checkout(&self, id: Uuid) -> AppResult<BookingRequest> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        self.touch(&mut session).await?;

        let seat_ids = session.selection.selected_ids().to_vec();
        if seat_ids.is_empty() {
            return Err(AppError::Validation("no seats selected".to_string()));
        }

        let booking_ref = new_booking_ref();
        match self.reservations.claim(&session.scope, &seat_ids, &booking_ref).await? {
            ClaimResult::Conflict(taken) => {
                for seat_id in &taken {
                    session.selection.apply_external_status(seat_id, SeatStatus::Occupied)?;
                    session.hold_deadlines.remove(seat_id);
                }
                self.release_holds(&session, &taken).await;
                Err(AppError::Conflict(taken))
            }
            ClaimResult::Claimed => {
                let seats = session.selection.selected_seats();
                let total = session.selection.total();
                for seat_id in &seat_ids {
                    session.selection.apply_external_status(seat_id, SeatStatus::Occupied)?;
                }
                session.hold_deadlines.clear();
                self.release_holds(&session, &seat_ids).await;

                info!("Session {} checked out {} seats as {}", id, seats.len(), booking_ref);
                Ok(BookingRequest {
                    booking_ref,
                    session_id: id,
                    layout_key: session.scope.layout_key.clone(),
                    date: session.scope.date,
                    seats,
                    total,
                })
            }
        }
    }

    pub async fn close(&self, id: Uuid) -> AppResult<()> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))?;
        let session = session.lock().await;
        let selected = session.selection.selected_ids().to_vec();
        self.release_holds(&session, &selected).await;
        info!("Closed session {}", id);
        Ok(())
    }

    /// Отмена оформленной брони: места снова продаются.
    /// Открытые сессии увидят их свободными после переоткрытия.
    pub async fn cancel_booking(&self, layout_key: &str, date: NaiveDate, booking_ref: &str) -> AppResult<u64> {
        self.preset(layout_key)?;
        let scope = LayoutScope::new(layout_key, date);
        let released = self.reservations.release(&scope, booking_ref).await?;
        if released == 0 {
            return Err(AppError::NotFound(format!("booking {} on {}", booking_ref, scope)));
        }
        info!("Booking {} cancelled, {} seats released on {}", booking_ref, released, scope);
        Ok(released)
    }

    pub async fn subscribe(&self, id: Uuid) -> AppResult<broadcast::Receiver<SelectionEvent>> {
        let session = self.get(id).await?;
        let session = session.lock().await;
        Ok(session.events.subscribe())
    }

    /// Закрывает сессии, неактивные дольше `session_ttl`. Возвращает их число.
    /// В остальных сессиях снимает выбор с мест, чьё удержание истекло.
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut lapsed: Vec<(LayoutScope, String, Vec<String>)> = Vec::new();
        let expired: Vec<(Uuid, Arc<Mutex<BookingSession>>)> = {
            let mut sessions = self.sessions.write().await;
            let mut expired = Vec::new();
            for (id, session) in sessions.iter() {
                // занятые сессии не трогаем, проверим в следующий проход
                if let Ok(mut s) = session.try_lock() {
                    if now.duration_since(s.last_seen) >= self.settings.session_ttl {
                        expired.push(*id);
                    } else {
                        match s.drop_expired_holds(now) {
                            Ok(seats) if !seats.is_empty() => {
                                lapsed.push((s.scope.clone(), s.holder(), seats))
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Session {} failed to drop lapsed holds: {}", id, e),
                        }
                    }
                }
            }
            expired
                .into_iter()
                .filter_map(|id| sessions.remove(&id).map(|s| (id, s)))
                .collect()
        };

        for (id, session) in &expired {
            let session = session.lock().await;
            let selected = session.selection.selected_ids().to_vec();
            self.release_holds(&session, &selected).await;
            debug!("Session {} expired, released {} holds", id, selected.len());
        }
        for (scope, holder, seats) in &lapsed {
            self.release_seats(scope, holder, seats).await;
        }
        expired.len()
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    // Любое обращение к сессии продлевает её жизнь и снимает истёкшие удержания
    async fn touch(&self, session: &mut BookingSession) -> AppResult<()> {
        let now = Instant::now();
        session.last_seen = now;
        let lapsed = session.drop_expired_holds(now)?;
        if !lapsed.is_empty() {
            debug!("Session {} lost {} lapsed holds", session.id, lapsed.len());
            self.release_seats(&session.scope, &session.holder(), &lapsed).await;
        }
        Ok(())
    }

    async fn release_holds(&self, session: &BookingSession, seat_ids: &[String]) {
        self.release_seats(&session.scope, &session.holder(), seat_ids).await;
    }

    // Снимается только своё удержание, чужое на том же месте остаётся
    async fn release_seats(&self, scope: &LayoutScope, holder: &str, seat_ids: &[String]) {
        for seat_id in seat_ids {
            if let Err(e) = self.holds.release(scope, seat_id, holder).await {
                // удержание всё равно истечёт по TTL
                warn!("Failed to release hold on {} for {}: {}", seat_id, holder, e);
            }
        }
    }
}

fn new_booking_ref() -> String {
    let id = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("BK-{}", &id[..10])
}
