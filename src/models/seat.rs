use serde::{Deserialize, Serialize};
use std::fmt;

// Статус места. Ровно один в каждый момент времени
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Occupied,
    Selected,
    /// Удержано другим пользователем или заблокировано
    Reserved,
}

impl SeatStatus {
    /// Места в этих статусах пользователь выбрать не может
    pub fn is_locked(self) -> bool {
        matches!(self, SeatStatus::Occupied | SeatStatus::Reserved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Occupied => "occupied",
            SeatStatus::Selected => "selected",
            SeatStatus::Reserved => "reserved",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Классификация: window/aisle/middle для транспорта, vip/premium/general для площадок
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatClass {
    Window,
    Aisle,
    Middle,
    Vip,
    Premium,
    General,
}

impl SeatClass {
    /// Ценовой уровень секции определяется только её множителем
    pub fn from_multiplier(multiplier: f64) -> Self {
        if multiplier >= 3.0 {
            SeatClass::Vip
        } else if multiplier >= 2.0 {
            SeatClass::Premium
        } else {
            SeatClass::General
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: String,
    pub display_number: String,
    pub classification: SeatClass,
    pub status: SeatStatus,
    pub price: f64,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

impl Seat {
    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }
}
