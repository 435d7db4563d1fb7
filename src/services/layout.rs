//! Генератор схем мест.
//!
//! По типу транспорта или площадки и его конфигурации строит полный,
//! детерминированный набор мест: id, подпись, классификация, цена и
//! начальный статус. Статус берётся только из [`OccupancySource`],
//! поэтому при одинаковом входе результат всегда одинаков.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::models::{
    Layout, LayoutConfig, Position, Seat, SeatClass, SeatStatus, TopologyKind, VehicleConfig,
    VenueConfig,
};
use crate::services::occupancy::{NoOccupancy, OccupancySource};
use crate::services::pricing;

const AUTO_LABELS: [&str; 3] = ["Copiloto", "Pasajero 1", "Pasajero 2"];

static NO_OCCUPANCY: NoOccupancy = NoOccupancy;

// Больше заранее не резервируем, дальше Vec растёт сам
const PREALLOC_LIMIT: usize = 4096;

/// Схема по имени типа; заблокированные позиции берутся из `config`
pub fn generate_layout(
    topology: &str,
    config: &LayoutConfig,
    base_price: f64,
    occupancy: &dyn OccupancySource,
    date: NaiveDate,
) -> Layout {
    LayoutGenerator::new(occupancy, date).generate_named(topology, config, base_price)
}

pub struct LayoutGenerator<'a> {
    occupancy: &'a dyn OccupancySource,
    date: NaiveDate,
}

impl LayoutGenerator<'static> {
    /// Генератор без данных о занятости: все места свободны
    pub fn preview() -> Self {
        Self { occupancy: &NO_OCCUPANCY, date: NaiveDate::default() }
    }
}

impl<'a> LayoutGenerator<'a> {
    pub fn new(occupancy: &'a dyn OccupancySource, date: NaiveDate) -> Self {
        Self { occupancy, date }
    }

    /// Неизвестный тип даёт пустую схему, а не ошибку
    pub fn generate_named(&self, topology: &str, config: &LayoutConfig, base_price: f64) -> Layout {
        match topology.parse::<TopologyKind>() {
            Ok(kind) => self.generate(kind, config, base_price),
            Err(e) => {
                warn!("Layout not generated: {}", e);
                Layout::empty()
            }
        }
    }

    pub fn generate(&self, topology: TopologyKind, config: &LayoutConfig, base_price: f64) -> Layout {
        let base_price = pricing::sanitize_base_price(base_price);

        let seats = match (topology.is_venue(), config) {
            (false, LayoutConfig::Vehicle(cfg)) if topology == TopologyKind::Auto => {
                self.auto_seats(cfg, base_price)
            }
            (false, LayoutConfig::Vehicle(cfg)) => self.vehicle_seats(topology, cfg, base_price),
            (true, LayoutConfig::Venue(cfg)) => self.venue_seats(cfg, base_price),
            _ => {
                warn!("Topology {} does not match the supplied layout config", topology);
                return Layout::empty();
            }
        };

        debug!("Generated {} layout with {} seats", topology, seats.len());

        Layout { topology: Some(topology), base_price, seats }
    }

    fn initial_status(&self, seat_id: &str) -> SeatStatus {
        if self.occupancy.is_occupied(seat_id, self.date) {
            SeatStatus::Occupied
        } else if self.occupancy.is_reserved(seat_id, self.date) {
            SeatStatus::Reserved
        } else {
            SeatStatus::Available
        }
    }

    fn vehicle_seats(&self, topology: TopologyKind, cfg: &VehicleConfig, base_price: f64) -> Vec<Seat> {
        let blocked: HashSet<usize> = cfg.blocked_positions.iter().copied().collect();
        let mut seats = Vec::with_capacity(cfg.try_capacity().unwrap_or(0).min(PREALLOC_LIMIT));
        let mut seat_number = 0u32;

        for row in 0..cfg.rows {
            for col in 0..cfg.cols {
                if cfg.driver_seat && row == 0 && col == 0 {
                    continue;
                }
                let index = row as usize * cfg.cols as usize + col as usize;
                if blocked.contains(&index) {
                    continue;
                }

                seat_number += 1;
                let id = format!("{}-{}", row, col);
                let classification = pricing::vehicle_class(topology, col, cfg.cols);
                seats.push(Seat {
                    status: self.initial_status(&id),
                    id,
                    display_number: seat_number.to_string(),
                    classification,
                    price: pricing::vehicle_price(topology, classification, row, base_price),
                    position: Position { row, col },
                    section_id: None,
                });
            }
        }

        seats
    }

    // Легковой авто: всегда 2x2, минус водитель
    fn auto_seats(&self, cfg: &VehicleConfig, base_price: f64) -> Vec<Seat> {
        const SIZE: u32 = 2;
        let blocked: HashSet<usize> = cfg.blocked_positions.iter().copied().collect();
        let mut seats = Vec::with_capacity(AUTO_LABELS.len());

        for row in 0..SIZE {
            for col in 0..SIZE {
                let index = (row * SIZE + col) as usize;
                if index == 0 || blocked.contains(&index) {
                    continue;
                }
                let id = format!("{}-{}", row, col);
                seats.push(Seat {
                    status: self.initial_status(&id),
                    id,
                    display_number: AUTO_LABELS[index - 1].to_string(),
                    classification: SeatClass::Window,
                    price: base_price,
                    position: Position { row, col },
                    section_id: None,
                });
            }
        }

        seats
    }

    fn venue_seats(&self, cfg: &VenueConfig, base_price: f64) -> Vec<Seat> {
        let mut seen = HashSet::new();
        let mut seats = Vec::with_capacity(cfg.capacity().min(PREALLOC_LIMIT));

        for section in &cfg.sections {
            if !seen.insert(section.id.as_str()) {
                warn!("Duplicate section id {} skipped", section.id);
                continue;
            }
            let classification = SeatClass::from_multiplier(section.multiplier);
            let price = pricing::venue_price(base_price, section.multiplier);

            for row in 0..section.rows {
                let label = row_label(row);
                for seat in 0..section.seats_per_row {
                    let id = format!("{}-R{}-S{}", section.id, row + 1, seat + 1);
                    seats.push(Seat {
                        status: self.initial_status(&id),
                        id,
                        display_number: format!("{}{}", label, seat + 1),
                        classification,
                        price,
                        position: Position { row, col: seat },
                        section_id: Some(section.id.clone()),
                    });
                }
            }
        }

        seats
    }
}

/// 0 → A, 25 → Z, 26 → AA
pub fn row_label(row: u32) -> String {
    let mut n = row as u64 + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        label.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}
