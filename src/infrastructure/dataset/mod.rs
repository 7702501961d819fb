//! Tariff dataset loading

mod csv_loader;

pub use csv_loader::load_from;
