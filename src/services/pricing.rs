//! Таблица классификации и цен по типам схем.
//!
//! | Тип           | Классификация                                   | Надбавка                 |
//! |---------------|-------------------------------------------------|--------------------------|
//! | minivan/combi | края → window, средняя колонка (cols ≥ 4) → aisle | нет                     |
//! | bus           | края → window, колонки 1–2 → aisle              | +5 за window             |
//! | boat          | края → window, остальные → middle               | +10 для рядов 0–1        |
//! | train         | колонки 0–1 → window                            | +15 за window            |
//! | auto          | все window                                      | нет                      |
//! | площадки      | по множителю секции (vip/premium/general)       | round(base × multiplier) |

use crate::models::{SeatClass, TopologyKind};

pub const BUS_WINDOW_SURCHARGE: f64 = 5.0;
pub const BOAT_FRONT_ROW_SURCHARGE: f64 = 10.0;
pub const BOAT_FRONT_ROWS: u32 = 2;
pub const TRAIN_WINDOW_SURCHARGE: f64 = 15.0;

/// Классификация места в транспорте по колонке
pub fn vehicle_class(topology: TopologyKind, col: u32, cols: u32) -> SeatClass {
    let last = cols.saturating_sub(1);
    match topology {
        // в поезде обе колонки считаются оконными
        TopologyKind::Train => {
            if col <= 1 {
                SeatClass::Window
            } else {
                SeatClass::Middle
            }
        }
        TopologyKind::Auto => SeatClass::Window,
        _ if col == 0 || col == last => SeatClass::Window,
        TopologyKind::Bus if col == 1 || col == 2 => SeatClass::Aisle,
        TopologyKind::Minivan | TopologyKind::Combi if cols >= 4 && col == cols / 2 => {
            SeatClass::Aisle
        }
        _ => SeatClass::Middle,
    }
}

pub fn vehicle_surcharge(topology: TopologyKind, class: SeatClass, row: u32) -> f64 {
    match (topology, class) {
        (TopologyKind::Bus, SeatClass::Window) => BUS_WINDOW_SURCHARGE,
        (TopologyKind::Train, SeatClass::Window) => TRAIN_WINDOW_SURCHARGE,
        (TopologyKind::Boat, _) if row < BOAT_FRONT_ROWS => BOAT_FRONT_ROW_SURCHARGE,
        _ => 0.0,
    }
}

pub fn vehicle_price(topology: TopologyKind, class: SeatClass, row: u32, base_price: f64) -> f64 {
    base_price + vehicle_surcharge(topology, class, row)
}

pub fn venue_price(base_price: f64, multiplier: f64) -> f64 {
    (base_price * multiplier.max(0.0)).round()
}

/// Отрицательная или нечисловая базовая цена приводится к нулю
pub fn sanitize_base_price(base_price: f64) -> f64 {
    if base_price.is_finite() && base_price > 0.0 {
        base_price
    } else {
        0.0
    }
}
