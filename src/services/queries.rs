use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Seat, SeatClass, SeatStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutSummary {
    pub total: usize,
    pub available: usize,
    pub occupied: usize,
    pub reserved: usize,
    pub selected: usize,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

pub fn summarize(seats: &[Seat]) -> LayoutSummary {
    let mut summary = LayoutSummary { total: seats.len(), ..Default::default() };
    for seat in seats {
        match seat.status {
            SeatStatus::Available => summary.available += 1,
            SeatStatus::Occupied => summary.occupied += 1,
            SeatStatus::Reserved => summary.reserved += 1,
            SeatStatus::Selected => summary.selected += 1,
        }
        summary.min_price = Some(summary.min_price.map_or(seat.price, |p| p.min(seat.price)));
        summary.max_price = Some(summary.max_price.map_or(seat.price, |p| p.max(seat.price)));
    }
    summary
}

pub fn count_by_status(seats: &[Seat], status: SeatStatus) -> usize {
    seats.iter().filter(|s| s.status == status).count()
}

pub fn seats_in_row(seats: &[Seat], row: u32) -> Vec<&Seat> {
    seats.iter().filter(|s| s.position.row == row).collect()
}

pub fn seats_in_section<'a>(seats: &'a [Seat], section_id: &str) -> Vec<&'a Seat> {
    seats
        .iter()
        .filter(|s| s.section_id.as_deref() == Some(section_id))
        .collect()
}

/// Минимальная цена по каждой классификации ("от 55")
pub fn price_by_class(seats: &[Seat]) -> BTreeMap<SeatClass, f64> {
    let mut prices = BTreeMap::new();
    for seat in seats {
        prices
            .entry(seat.classification)
            .and_modify(|p: &mut f64| *p = p.min(seat.price))
            .or_insert(seat.price);
    }
    prices
}

pub fn total_price<'a>(seats: impl IntoIterator<Item = &'a Seat>) -> f64 {
    seats.into_iter().map(|s| s.price).sum()
}
