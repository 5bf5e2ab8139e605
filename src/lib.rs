//! cultivar: A Fast, Modular Raster & Vector Processor for Agricultural Remote Sensing
//!
//! This library batch-processes the rasters and field boundaries of an
//! agricultural remote-sensing campaign: clipping imagery to plot boundaries,
//! repairing implicit no-data markers, scaling pixel values, converting grids
//! to pixel-centroid point layers, overlaying vector layers, and tiled
//! band-ratio normalization of RGB orthomosaics.
//!
//! Every operation is stateless: it reads one or two input files, transforms
//! in memory (or one tile window at a time), and writes a derived output file
//! next to the input.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BandStack, BoundingBox, GeoError, GeoResult, GeoTransform, PixelValue, RasterGrid,
    RasterProfile, TileWindow,
};

pub use crate::core::{
    clip_raster_by_boundary, correct_nodata, intersect_layers, raster_to_points, rewrite_crs,
    BandRatioNormalizer, OverlaySummary, RasterScaler, RatioLayout, ScalingMethod,
};

pub use io::{derived_path, read_band, write_geotiff};
