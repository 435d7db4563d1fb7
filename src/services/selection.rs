//! Машина состояний выбора мест.
//!
//! Владеет набором мест одной схемы и упорядоченным списком выбранных id.
//! Инварианты:
//! - выбранных мест не больше `max_seats` (если лимит задан);
//! - каждое место из списка имеет статус `selected`, остальные нет;
//! - `occupied`/`reserved` пользователь выбрать не может.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::models::{Layout, Seat, SeatStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("seat {0} not found in layout")]
    SeatNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    /// Место занято или удержано, клик проигнорирован
    Locked,
    /// Достигнут лимит мест, клик проигнорирован
    SelectionFull,
}

impl ToggleOutcome {
    pub fn changed(self) -> bool {
        matches!(self, ToggleOutcome::Selected | ToggleOutcome::Deselected)
    }
}

/// Получатель изменений выбора (корзина, WebSocket и т.п.)
pub trait SelectionListener: Send + Sync {
    fn on_selection_change(&self, selected: &[Seat]);
}

impl<F> SelectionListener for F
where
    F: Fn(&[Seat]) + Send + Sync,
{
    fn on_selection_change(&self, selected: &[Seat]) {
        self(selected)
    }
}

pub struct SeatSelection {
    seats: Vec<Seat>,
    index: HashMap<String, usize>,
    selected: Vec<String>,
    max_seats: Option<usize>,
    listeners: Vec<Box<dyn SelectionListener>>,
}

impl fmt::Debug for SeatSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeatSelection")
            .field("seats", &self.seats.len())
            .field("selected", &self.selected)
            .field("max_seats", &self.max_seats)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SeatSelection {
    /// Места, пришедшие из генератора со статусом `selected`, считаются свободными
    pub fn new(layout: Layout, max_seats: Option<usize>) -> Self {
        let mut seats = layout.seats;
        for seat in seats.iter_mut() {
            if seat.status == SeatStatus::Selected {
                seat.status = SeatStatus::Available;
            }
        }
        let index = seats.iter().enumerate().map(|(i, s)| (s.id.clone(), i)).collect();
        Self { seats, index, selected: Vec::new(), max_seats, listeners: Vec::new() }
    }

    pub fn subscribe(&mut self, listener: impl SelectionListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn toggle(&mut self, seat_id: &str) -> Result<ToggleOutcome, SelectionError> {
        let Some(&i) = self.index.get(seat_id) else {
            warn!("Toggle on unknown seat {}", seat_id);
            return Err(SelectionError::SeatNotFound(seat_id.to_string()));
        };

        let outcome = match self.seats[i].status {
            SeatStatus::Occupied | SeatStatus::Reserved => ToggleOutcome::Locked,
            SeatStatus::Selected => {
                self.seats[i].status = SeatStatus::Available;
                self.selected.retain(|id| id != seat_id);
                ToggleOutcome::Deselected
            }
            SeatStatus::Available if self.is_full() => ToggleOutcome::SelectionFull,
            SeatStatus::Available => {
                self.seats[i].status = SeatStatus::Selected;
                self.selected.push(seat_id.to_string());
                ToggleOutcome::Selected
            }
        };

        if outcome.changed() {
            self.notify();
        }
        Ok(outcome)
    }

    /// Сумма цен выбранных мест
    pub fn total(&self) -> f64 {
        self.selected
            .iter()
            .filter_map(|id| self.index.get(id))
            .map(|&i| self.seats[i].price)
            .sum()
    }

    pub fn reset(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        for id in self.selected.drain(..) {
            if let Some(&i) = self.index.get(&id) {
                self.seats[i].status = SeatStatus::Available;
            }
        }
        self.notify();
    }

    /// Статус, пришедший извне (место продано или удержано другим).
    /// Выбранное место при этом выпадает из выбора.
    pub fn apply_external_status(&mut self, seat_id: &str, status: SeatStatus) -> Result<(), SelectionError> {
        let Some(&i) = self.index.get(seat_id) else {
            return Err(SelectionError::SeatNotFound(seat_id.to_string()));
        };
        if status == SeatStatus::Selected {
            // выбрать место можно только через toggle
            return Ok(());
        }

        let was_selected = self.seats[i].status == SeatStatus::Selected;
        self.seats[i].status = status;
        if was_selected {
            self.selected.retain(|id| id != seat_id);
            self.notify();
        }
        Ok(())
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selected
    }

    pub fn selected_seats(&self) -> Vec<Seat> {
        self.selected
            .iter()
            .filter_map(|id| self.index.get(id))
            .map(|&i| self.seats[i].clone())
            .collect()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, seat_id: &str) -> Option<&Seat> {
        self.index.get(seat_id).map(|&i| &self.seats[i])
    }

    pub fn max_seats(&self) -> Option<usize> {
        self.max_seats
    }

    /// Новый лимит не отменяет уже выбранные места
    pub fn set_max_seats(&mut self, max_seats: Option<usize>) {
        self.max_seats = max_seats;
    }

    pub fn remaining_capacity(&self) -> Option<usize> {
        self.max_seats.map(|max| max.saturating_sub(self.selected.len()))
    }

    pub fn is_full(&self) -> bool {
        self.max_seats.is_some_and(|max| self.selected.len() >= max)
    }

    fn notify(&self) {
        if self.listeners.is_empty() {
            return;
        }
        let selected = self.selected_seats();
        for listener in &self.listeners {
            listener.on_selection_change(&selected);
        }
    }
}
