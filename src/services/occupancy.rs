use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::models::TopologyKind;

/// Источник занятости мест. Запрашивается один раз на генерацию схемы.
pub trait OccupancySource {
    fn is_occupied(&self, seat_id: &str, date: NaiveDate) -> bool;

    /// Место удержано другой сессией
    fn is_reserved(&self, _seat_id: &str, _date: NaiveDate) -> bool {
        false
    }
}

impl<T: OccupancySource + ?Sized> OccupancySource for &T {
    fn is_occupied(&self, seat_id: &str, date: NaiveDate) -> bool {
        (**self).is_occupied(seat_id, date)
    }

    fn is_reserved(&self, seat_id: &str, date: NaiveDate) -> bool {
        (**self).is_reserved(seat_id, date)
    }
}

/// Объединение двух источников: место занято, если занято хотя бы в одном
#[derive(Debug, Clone)]
pub struct Layered<A, B>(pub A, pub B);

impl<A: OccupancySource, B: OccupancySource> OccupancySource for Layered<A, B> {
    fn is_occupied(&self, seat_id: &str, date: NaiveDate) -> bool {
        self.0.is_occupied(seat_id, date) || self.1.is_occupied(seat_id, date)
    }

    fn is_reserved(&self, seat_id: &str, date: NaiveDate) -> bool {
        self.0.is_reserved(seat_id, date) || self.1.is_reserved(seat_id, date)
    }
}

/// Все места свободны (предпросмотр схемы)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOccupancy;

impl OccupancySource for NoOccupancy {
    fn is_occupied(&self, _seat_id: &str, _date: NaiveDate) -> bool {
        false
    }
}

/// Снимок занятых и удержанных мест, загруженный заранее
#[derive(Debug, Clone, Default)]
pub struct OccupiedSeats {
    pub occupied: HashSet<String>,
    pub reserved: HashSet<String>,
}

impl OccupiedSeats {
    pub fn new(occupied: HashSet<String>, reserved: HashSet<String>) -> Self {
        Self { occupied, reserved }
    }

    pub fn from_occupied<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { occupied: ids.into_iter().map(Into::into).collect(), reserved: HashSet::new() }
    }
}

impl OccupancySource for OccupiedSeats {
    fn is_occupied(&self, seat_id: &str, _date: NaiveDate) -> bool {
        self.occupied.contains(seat_id)
    }

    fn is_reserved(&self, seat_id: &str, _date: NaiveDate) -> bool {
        self.reserved.contains(seat_id)
    }
}

/// Детерминированная "случайная" занятость для демо-стендов без реальных броней.
/// Одно и то же место на одну и ту же дату всегда получает один и тот же ответ.
#[derive(Debug, Clone)]
pub struct DemoOccupancy {
    scope: String,
    rate: f64,
}

impl DemoOccupancy {
    pub fn new(scope: impl Into<String>, rate: f64) -> Self {
        Self { scope: scope.into(), rate: rate.clamp(0.0, 1.0) }
    }

    pub fn for_topology(scope: impl Into<String>, topology: TopologyKind) -> Self {
        Self::new(scope, default_rate(topology))
    }

    fn sample(&self, seat_id: &str, date: NaiveDate) -> f64 {
        let mut hasher = Sha256::new();
        hasher.update(self.scope.as_bytes());
        hasher.update(b"|");
        hasher.update(seat_id.as_bytes());
        hasher.update(b"|");
        hasher.update(date.to_string().as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl OccupancySource for DemoOccupancy {
    fn is_occupied(&self, seat_id: &str, date: NaiveDate) -> bool {
        self.sample(seat_id, date) < self.rate
    }
}

/// Доля занятых мест по умолчанию для каждого типа
pub fn default_rate(topology: TopologyKind) -> f64 {
    match topology {
        TopologyKind::Boat => 0.25,
        TopologyKind::Train => 0.2,
        TopologyKind::Auto => 0.1,
        _ => 0.3,
    }
}
