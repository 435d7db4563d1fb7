//! Справочник маршрутов и площадок.
//!
//! Встроенный набор можно заменить файлом (TOML/JSON), путь задаётся `CATALOG_PATH`.

use serde::{Deserialize, Serialize};

use super::layout::{LayoutConfig, Section, SectionKind, TopologyKind, VehicleConfig, VenueConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePreset {
    pub key: String,
    pub name: String,
    pub origin: String,
    pub destination: String,
    pub topology: TopologyKind,
    pub vehicle: VehicleConfig,
    pub base_price: f64,
    #[serde(default)]
    pub max_seats: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenuePreset {
    pub key: String,
    pub name: String,
    pub city: String,
    pub topology: TopologyKind,
    pub venue: VenueConfig,
    pub base_price: f64,
    #[serde(default)]
    pub max_seats: Option<usize>,
}

/// Всё, что нужно генератору для одной схемы
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPreset {
    pub key: String,
    pub name: String,
    pub topology: TopologyKind,
    pub config: LayoutConfig,
    pub base_price: f64,
    pub max_seats: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub routes: Vec<RoutePreset>,
    #[serde(default)]
    pub venues: Vec<VenuePreset>,
}

impl Catalog {
    pub fn load(path: &str) -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .build()?
            .try_deserialize()
    }

    pub fn find(&self, key: &str) -> Option<LayoutPreset> {
        if let Some(route) = self.routes.iter().find(|r| r.key == key) {
            return Some(LayoutPreset {
                key: route.key.clone(),
                name: route.name.clone(),
                topology: route.topology,
                config: LayoutConfig::Vehicle(route.vehicle.clone()),
                base_price: route.base_price,
                max_seats: route.max_seats,
            });
        }
        self.venues.iter().find(|v| v.key == key).map(|venue| LayoutPreset {
            key: venue.key.clone(),
            name: venue.name.clone(),
            topology: venue.topology,
            config: LayoutConfig::Venue(venue.venue.clone()),
            base_price: venue.base_price,
            max_seats: venue.max_seats,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.routes
            .iter()
            .map(|r| r.key.as_str())
            .chain(self.venues.iter().map(|v| v.key.as_str()))
    }

    pub fn builtin() -> Self {
        Catalog {
            routes: vec![
                route(
                    "cusco-urubamba-minivan",
                    "Cusco - Urubamba",
                    ("Cusco", "Urubamba"),
                    TopologyKind::Minivan,
                    VehicleConfig::new(4, 4).with_driver(),
                    15.0,
                ),
                route(
                    "cusco-pisac-combi",
                    "Cusco - Pisac",
                    ("Cusco", "Pisac"),
                    TopologyKind::Combi,
                    VehicleConfig::new(5, 4).with_driver().with_blocked([3]),
                    8.0,
                ),
                route(
                    "cusco-puno-bus",
                    "Cusco - Puno",
                    ("Cusco", "Puno"),
                    TopologyKind::Bus,
                    // туалет в хвосте
                    VehicleConfig::new(12, 4).with_blocked([46, 47]),
                    50.0,
                ),
                route(
                    "puno-uros-boat",
                    "Puno - Islas Uros",
                    ("Puno", "Uros"),
                    TopologyKind::Boat,
                    VehicleConfig::new(6, 4),
                    35.0,
                ),
                route(
                    "cusco-aguas-calientes-train",
                    "Cusco - Aguas Calientes",
                    ("Cusco", "Aguas Calientes"),
                    TopologyKind::Train,
                    VehicleConfig::new(10, 2),
                    120.0,
                ),
                route(
                    "cusco-airport-auto",
                    "Cusco - Aeropuerto",
                    ("Cusco", "Aeropuerto Velasco Astete"),
                    TopologyKind::Auto,
                    VehicleConfig::new(2, 2).with_driver(),
                    25.0,
                ),
            ],
            venues: vec![
                VenuePreset {
                    key: "teatro-municipal".into(),
                    name: "Teatro Municipal del Cusco".into(),
                    city: "Cusco".into(),
                    topology: TopologyKind::Theater,
                    venue: VenueConfig {
                        sections: vec![
                            section("palco", "Palco", SectionKind::Palco, (2, 6), 3.0, "#f59e0b"),
                            section("platea", "Platea", SectionKind::Platea, (10, 16), 2.0, "#3b82f6"),
                            section("galeria", "Galería", SectionKind::Galeria, (6, 20), 1.0, "#10b981"),
                        ],
                    },
                    base_price: 40.0,
                    max_seats: None,
                },
                VenuePreset {
                    key: "estadio-garcilaso".into(),
                    name: "Estadio Inca Garcilaso de la Vega".into(),
                    city: "Cusco".into(),
                    topology: TopologyKind::Stadium,
                    venue: VenueConfig {
                        sections: vec![
                            section("occidente", "Occidente", SectionKind::Tribuna, (15, 30), 2.5, "#ef4444"),
                            section("oriente", "Oriente", SectionKind::Tribuna, (15, 30), 1.5, "#3b82f6"),
                            section("norte", "Norte", SectionKind::General, (12, 25), 1.0, "#6b7280"),
                            section("sur", "Sur", SectionKind::General, (12, 25), 1.0, "#6b7280"),
                        ],
                    },
                    base_price: 30.0,
                    max_seats: None,
                },
                VenuePreset {
                    key: "arena-cusco".into(),
                    name: "Arena Cusco".into(),
                    city: "Cusco".into(),
                    topology: TopologyKind::Arena,
                    venue: VenueConfig {
                        sections: vec![
                            section("vip", "VIP", SectionKind::General, (3, 10), 3.5, "#a855f7"),
                            section("preferencial", "Preferencial", SectionKind::General, (8, 14), 2.0, "#f97316"),
                            section("general", "General", SectionKind::General, (10, 20), 1.0, "#22c55e"),
                        ],
                    },
                    base_price: 60.0,
                    max_seats: Some(10),
                },
            ],
        }
    }
}

fn route(
    key: &str,
    name: &str,
    (origin, destination): (&str, &str),
    topology: TopologyKind,
    vehicle: VehicleConfig,
    base_price: f64,
) -> RoutePreset {
    RoutePreset {
        key: key.to_string(),
        name: name.to_string(),
        origin: origin.to_string(),
        destination: destination.to_string(),
        topology,
        vehicle,
        base_price,
        max_seats: None,
    }
}

fn section(
    id: &str,
    name: &str,
    kind: SectionKind,
    (rows, seats_per_row): (u32, u32),
    multiplier: f64,
    color: &str,
) -> Section {
    Section {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        rows,
        seats_per_row,
        multiplier,
        color: color.to_string(),
    }
}
