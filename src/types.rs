use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

/// Real-valued pixel data
pub type PixelValue = f32;

/// 2D single-band raster grid (row x column)
pub type RasterGrid = Array2<PixelValue>;

/// 3D multi-band raster data (band x row x column)
pub type BandStack = Array3<PixelValue>;

/// Geospatial transformation parameters (pixel -> world affine mapping)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from a GDAL coefficient array
    /// [top_left_x, pixel_width, rotation_x, top_left_y, rotation_y, pixel_height]
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            top_left_x: coeffs[0],
            pixel_width: coeffs[1],
            rotation_x: coeffs[2],
            top_left_y: coeffs[3],
            rotation_y: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// Convert back to the GDAL coefficient array
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// World coordinates of the centroid of pixel (col, row).
    ///
    /// The centroid sits half a pixel into the cell: transform * (col + 0.5, row + 0.5).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let col_f = col as f64 + 0.5;
        let row_f = row as f64 + 0.5;

        let x = self.top_left_x + col_f * self.pixel_width + row_f * self.rotation_x;
        let y = self.top_left_y + col_f * self.rotation_y + row_f * self.pixel_height;

        (x, y)
    }

    /// World coordinates of the top-left corner of pixel (col, row)
    pub fn pixel_corner(&self, col: usize, row: usize) -> (f64, f64) {
        let col_f = col as f64;
        let row_f = row as f64;

        let x = self.top_left_x + col_f * self.pixel_width + row_f * self.rotation_x;
        let y = self.top_left_y + col_f * self.rotation_y + row_f * self.pixel_height;

        (x, y)
    }

    /// Fractional pixel coordinates of a world position.
    ///
    /// Returns NaN for a degenerate (non-invertible) transform.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y;

        if det.abs() < 1e-10 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.top_left_x;
        let dy = y - self.top_left_y;

        let col = (self.pixel_height * dx - self.rotation_x * dy) / det;
        let row = (-self.rotation_y * dx + self.pixel_width * dy) / det;

        (col, row)
    }
}

/// Geospatial bounding extent in layer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Extent containing no area, ready to be grown
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Grow this extent to include another
    pub fn expand(&mut self, other: &BoundingBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// True when the other extent lies fully inside this one (within tolerance)
    pub fn contains(&self, other: &BoundingBox, tol: f64) -> bool {
        other.min_x >= self.min_x - tol
            && other.max_x <= self.max_x + tol
            && other.min_y >= self.min_y - tol
            && other.max_y <= self.max_y + tol
    }
}

/// Metadata describing a raster file: dimensions, georeferencing and the
/// designated missing-value marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterProfile {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    /// Projection as WKT, empty when the file carries none
    pub projection: String,
    /// Missing-value marker declared in the file metadata
    pub nodata: Option<f64>,
}

/// Rectangular sub-region of a raster pixel grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileWindow {
    pub x_off: usize,
    pub y_off: usize,
    pub width: usize,
    pub height: usize,
}

/// Error types for raster and vector processing
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Reference system mismatch: {left} vs {right}")]
    CrsMismatch { left: String, right: String },

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for processing operations
pub type GeoResult<T> = Result<T, GeoError>;
