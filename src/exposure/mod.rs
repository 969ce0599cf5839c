//! Exposure: geolocated, valued assets with per-hazard curve assignments

mod data;

pub use data::{Asset, AssetSet};
