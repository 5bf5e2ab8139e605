//! Raster and vector file I/O

pub mod raster;
pub mod vector;

pub use raster::{derived_path, read_band, read_profile, write_geotiff};
pub use vector::{crs_label, open_vector, FieldColumn, PointRecord};
