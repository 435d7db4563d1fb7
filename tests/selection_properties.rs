//! Инварианты генератора схем и выбора мест на произвольных конфигурациях.

use proptest::prelude::*;
use std::collections::HashSet;

use seat_booking::models::{
    LayoutConfig, Section, SectionKind, SeatStatus, TopologyKind, VehicleConfig, VenueConfig,
};
use seat_booking::services::layout::LayoutGenerator;
use seat_booking::services::occupancy::DemoOccupancy;
use seat_booking::services::selection::{SeatSelection, ToggleOutcome};

// ── Strategies ──────────────────────────────────────────────────────────

fn vehicle_topology() -> impl Strategy<Value = TopologyKind> {
    prop_oneof![
        Just(TopologyKind::Minivan),
        Just(TopologyKind::Combi),
        Just(TopologyKind::Bus),
        Just(TopologyKind::Boat),
        Just(TopologyKind::Train),
    ]
}

fn venue_topology() -> impl Strategy<Value = TopologyKind> {
    prop_oneof![
        Just(TopologyKind::Theater),
        Just(TopologyKind::Stadium),
        Just(TopologyKind::Arena),
    ]
}

fn vehicle_config() -> impl Strategy<Value = VehicleConfig> {
    (1u32..15, 1u32..7, any::<bool>(), prop::collection::vec(0usize..120, 0..6)).prop_map(
        |(rows, cols, driver, blocked)| {
            let mut cfg = VehicleConfig::new(rows, cols).with_blocked(blocked);
            cfg.driver_seat = driver;
            cfg
        },
    )
}

fn venue_config() -> impl Strategy<Value = VenueConfig> {
    prop::collection::vec((0u32..8, 0u32..12, 0.5f64..4.0), 1..4).prop_map(|sections| VenueConfig {
        sections: sections
            .into_iter()
            .enumerate()
            .map(|(i, (rows, seats_per_row, multiplier))| Section {
                id: format!("s{}", i),
                name: format!("Section {}", i),
                kind: SectionKind::General,
                rows,
                seats_per_row,
                multiplier,
                color: "#000000".to_string(),
            })
            .collect(),
    })
}

fn any_layout() -> impl Strategy<Value = (TopologyKind, LayoutConfig)> {
    prop_oneof![
        (vehicle_topology(), vehicle_config()).prop_map(|(t, c)| (t, LayoutConfig::Vehicle(c))),
        (venue_topology(), venue_config()).prop_map(|(t, c)| (t, LayoutConfig::Venue(c))),
    ]
}

fn expected_vehicle_seats(cfg: &VehicleConfig) -> usize {
    let blocked: HashSet<usize> = cfg.blocked_positions.iter().copied().collect();
    let total = cfg.rows as usize * cfg.cols as usize;
    (0..total)
        .filter(|&i| !(cfg.driver_seat && i == 0))
        .filter(|i| !blocked.contains(i))
        .count()
}

// ── Generation ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn seat_ids_are_unique((topology, config) in any_layout(), base_price in 0.0f64..500.0) {
        let layout = LayoutGenerator::preview().generate(topology, &config, base_price);
        let ids: HashSet<&str> = layout.seats.iter().map(|s| s.id.as_str()).collect();
        prop_assert_eq!(ids.len(), layout.seats.len());
    }

    #[test]
    fn seat_count_matches_config((topology, config) in any_layout()) {
        let layout = LayoutGenerator::preview().generate(topology, &config, 20.0);
        let expected = match &config {
            LayoutConfig::Vehicle(cfg) => expected_vehicle_seats(cfg),
            LayoutConfig::Venue(cfg) => cfg.capacity(),
        };
        prop_assert_eq!(layout.len(), expected);
    }

    #[test]
    fn prices_are_never_negative((topology, config) in any_layout(), base_price in -100.0f64..500.0) {
        let layout = LayoutGenerator::preview().generate(topology, &config, base_price);
        for seat in &layout.seats {
            prop_assert!(seat.price.is_finite());
            prop_assert!(seat.price >= 0.0, "seat {} priced {}", seat.id, seat.price);
        }
    }

    #[test]
    fn generation_is_deterministic((topology, config) in any_layout(), scope in "[a-z]{1,8}") {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 6, 24).unwrap();
        let occupancy = DemoOccupancy::for_topology(scope, topology);
        let generator = LayoutGenerator::new(&occupancy, date);
        prop_assert_eq!(
            generator.generate(topology, &config, 30.0),
            generator.generate(topology, &config, 30.0)
        );
    }
}

// ── Selection ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn selection_never_exceeds_limit(
        (topology, config) in any_layout(),
        max_seats in 1usize..6,
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..40),
    ) {
        let layout = LayoutGenerator::preview().generate(topology, &config, 10.0);
        prop_assume!(!layout.is_empty());
        let ids: Vec<String> = layout.seats.iter().map(|s| s.id.clone()).collect();

        let mut selection = SeatSelection::new(layout, Some(max_seats));
        for pick in picks {
            selection.toggle(pick.get::<String>(&ids)).unwrap();
            prop_assert!(selection.selected_ids().len() <= max_seats);
        }
    }

    #[test]
    fn double_toggle_restores_state(
        (topology, config) in any_layout(),
        warmup in prop::collection::vec(any::<prop::sample::Index>(), 0..10),
        pick in any::<prop::sample::Index>(),
    ) {
        let layout = LayoutGenerator::preview().generate(topology, &config, 10.0);
        prop_assume!(!layout.is_empty());
        let ids: Vec<String> = layout.seats.iter().map(|s| s.id.clone()).collect();

        // без лимита повторное нажатие всегда отменяет первое
        let mut selection = SeatSelection::new(layout, None);
        for w in warmup {
            selection.toggle(w.get::<String>(&ids)).unwrap();
        }

        let before: HashSet<String> = selection.selected_ids().iter().cloned().collect();
        let seat_id = pick.get(&ids);
        let status_before = selection.seat(seat_id).unwrap().status;

        let first = selection.toggle(seat_id).unwrap();
        let second = selection.toggle(seat_id).unwrap();
        prop_assert!(first.changed() && second.changed());

        let after: HashSet<String> = selection.selected_ids().iter().cloned().collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(selection.seat(seat_id).unwrap().status, status_before);
    }

    #[test]
    fn total_is_sum_of_selected_prices(
        (topology, config) in any_layout(),
        base_price in 0.0f64..300.0,
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..30),
    ) {
        let layout = LayoutGenerator::preview().generate(topology, &config, base_price);
        prop_assume!(!layout.is_empty());
        let ids: Vec<String> = layout.seats.iter().map(|s| s.id.clone()).collect();

        let mut selection = SeatSelection::new(layout, Some(8));
        for pick in picks {
            selection.toggle(pick.get::<String>(&ids)).unwrap();
        }

        let expected: f64 = selection
            .seats()
            .iter()
            .filter(|s| s.status == SeatStatus::Selected)
            .map(|s| s.price)
            .sum();
        prop_assert!((selection.total() - expected).abs() < 1e-6);
        prop_assert_eq!(
            selection.selected_ids().len(),
            selection.seats().iter().filter(|s| s.status == SeatStatus::Selected).count()
        );
    }

    #[test]
    fn locked_seats_never_become_selected(
        (topology, config) in any_layout(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..30),
    ) {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 6, 24).unwrap();
        let occupancy = DemoOccupancy::new("locked", 0.5);
        let layout = LayoutGenerator::new(&occupancy, date).generate(topology, &config, 10.0);
        prop_assume!(!layout.is_empty());
        let ids: Vec<String> = layout.seats.iter().map(|s| s.id.clone()).collect();
        let occupied: HashSet<String> = layout
            .seats
            .iter()
            .filter(|s| s.status == SeatStatus::Occupied)
            .map(|s| s.id.clone())
            .collect();

        let mut selection = SeatSelection::new(layout, None);
        for pick in picks {
            let seat_id = pick.get(&ids);
            let outcome = selection.toggle(seat_id).unwrap();
            if occupied.contains(seat_id) {
                prop_assert_eq!(outcome, ToggleOutcome::Locked);
            }
        }
        for seat_id in &occupied {
            prop_assert_eq!(selection.seat(seat_id).unwrap().status, SeatStatus::Occupied);
        }
    }
}
