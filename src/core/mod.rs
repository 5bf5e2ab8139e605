//! Core raster and vector processing modules

pub mod band_ratio;
pub mod clip;
pub mod nodata;
pub mod overlay;
pub mod reproject;
pub mod scale;
pub mod to_points;

// Re-export main types
pub use band_ratio::{BandRatioNormalizer, RatioLayout};
pub use clip::clip_raster_by_boundary;
pub use nodata::{apply_sentinel_heuristic, correct_nodata, has_canonical_marker};
pub use overlay::{intersect_layers, OverlaySummary};
pub use reproject::rewrite_crs;
pub use scale::{RasterScaler, ScalingMethod};
pub use to_points::raster_to_points;
