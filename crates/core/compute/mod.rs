//! Zoom resolution, validation, spatial indexing and GeoJSON export.

#[cfg(feature = "geojson")]
pub mod geojson;
pub mod spatial;
pub mod validation;
pub mod zoom;
