use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::seat::Seat;

/// Тип транспорта или площадки. Закрытый набор, выбирается один раз при генерации.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyKind {
    Minivan,
    Combi,
    Bus,
    Boat,
    Train,
    Auto,
    Theater,
    Stadium,
    Arena,
}

impl TopologyKind {
    pub const ALL: [TopologyKind; 9] = [
        TopologyKind::Minivan,
        TopologyKind::Combi,
        TopologyKind::Bus,
        TopologyKind::Boat,
        TopologyKind::Train,
        TopologyKind::Auto,
        TopologyKind::Theater,
        TopologyKind::Stadium,
        TopologyKind::Arena,
    ];

    pub fn is_venue(self) -> bool {
        matches!(self, TopologyKind::Theater | TopologyKind::Stadium | TopologyKind::Arena)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TopologyKind::Minivan => "minivan",
            TopologyKind::Combi => "combi",
            TopologyKind::Bus => "bus",
            TopologyKind::Boat => "boat",
            TopologyKind::Train => "train",
            TopologyKind::Auto => "auto",
            TopologyKind::Theater => "theater",
            TopologyKind::Stadium => "stadium",
            TopologyKind::Arena => "arena",
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown topology: {0}")]
pub struct UnknownTopology(pub String);

impl FromStr for TopologyKind {
    type Err = UnknownTopology;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        TopologyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownTopology(s.to_string()))
    }
}

// Сетка транспорта
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleConfig {
    pub rows: u32,
    pub cols: u32,
    /// Позиция (0, 0) занята водителем и не становится местом
    #[serde(default)]
    pub driver_seat: bool,
    /// Линейные индексы row * cols + col (туалет, проход у двери и т.п.)
    #[serde(default)]
    pub blocked_positions: Vec<usize>,
}

impl VehicleConfig {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols, driver_seat: false, blocked_positions: Vec::new() }
    }

    pub fn with_driver(mut self) -> Self {
        self.driver_seat = true;
        self
    }

    pub fn with_blocked(mut self, positions: impl IntoIterator<Item = usize>) -> Self {
        self.blocked_positions.extend(positions);
        self
    }

    pub fn try_capacity(&self) -> Option<usize> {
        (self.rows as usize).checked_mul(self.cols as usize)
    }
}

/// Подпись секции для отображения. На цену не влияет.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Palco,
    Platea,
    Galeria,
    Tribuna,
    #[default]
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: SectionKind,
    pub rows: u32,
    pub seats_per_row: u32,
    pub multiplier: f64,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#9ca3af".to_string()
}

impl Section {
    /// `None`, если размер не помещается в `usize`
    pub fn try_capacity(&self) -> Option<usize> {
        (self.rows as usize).checked_mul(self.seats_per_row as usize)
    }

    pub fn capacity(&self) -> usize {
        self.try_capacity().unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueConfig {
    pub sections: Vec<Section>,
}

impl VenueConfig {
    pub fn try_capacity(&self) -> Option<usize> {
        self.sections
            .iter()
            .try_fold(0usize, |total, section| total.checked_add(section.try_capacity()?))
    }

    /// Насыщающая сумма; для проверки лимитов есть `try_capacity`
    pub fn capacity(&self) -> usize {
        self.try_capacity().unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayoutConfig {
    Vehicle(VehicleConfig),
    Venue(VenueConfig),
}

impl LayoutConfig {
    /// Число позиций до вычета водителя и заблокированных мест
    pub fn try_capacity(&self) -> Option<usize> {
        match self {
            LayoutConfig::Vehicle(v) => v.try_capacity(),
            LayoutConfig::Venue(v) => v.try_capacity(),
        }
    }
}

/// Результат генерации: полный набор мест одной схемы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub topology: Option<TopologyKind>,
    pub base_price: f64,
    pub seats: Vec<Seat>,
}

impl Layout {
    pub fn empty() -> Self {
        Self { topology: None, base_price: 0.0, seats: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn seat(&self, seat_id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == seat_id)
    }
}

/// Конкретный рейс или показ: схема из справочника на дату
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutScope {
    pub layout_key: String,
    pub date: NaiveDate,
}

impl LayoutScope {
    pub fn new(layout_key: impl Into<String>, date: NaiveDate) -> Self {
        Self { layout_key: layout_key.into(), date }
    }
}

impl fmt::Display for LayoutScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.layout_key, self.date)
    }
}
