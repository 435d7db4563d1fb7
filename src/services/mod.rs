pub mod pricing;
pub mod occupancy;
pub mod layout;
pub mod selection;
pub mod queries;
pub mod holds;
pub mod reservations;
pub mod sessions;
pub mod cleanup;
