pub mod seat;
pub mod layout;
pub mod catalog;

pub use seat::{Position, Seat, SeatClass, SeatStatus};
pub use layout::{
    Layout, LayoutConfig, LayoutScope, Section, SectionKind, TopologyKind, UnknownTopology, VehicleConfig,
    VenueConfig,
};
pub use catalog::{Catalog, LayoutPreset, RoutePreset, VenuePreset};
