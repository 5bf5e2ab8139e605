use crate::core::nodata::apply_sentinel_heuristic;
use crate::io::raster::{derived_path, read_band, write_geotiff};
use crate::types::{GeoResult, RasterGrid};
use std::path::{Path, PathBuf};

/// Available pixel scaling methods
#[derive(Debug, Clone, Copy)]
pub enum ScalingMethod {
    /// Mean/standard-deviation scaling: (p - mean) / std
    Normalize,
    /// Min/max scaling into [0, 1]: (p - min) / (max - min)
    Standardize,
}

impl ScalingMethod {
    fn output_suffix(&self) -> &'static str {
        match self {
            ScalingMethod::Normalize => "_Normalized.tif",
            ScalingMethod::Standardize => "_Stand.tif",
        }
    }
}

/// Single-band raster scaling processor
pub struct RasterScaler {
    method: ScalingMethod,
}

impl RasterScaler {
    pub fn new(method: ScalingMethod) -> Self {
        Self { method }
    }

    /// Scale a single-band raster and write the result next to the input.
    ///
    /// Statistics are computed over non-missing pixels only; the sentinel
    /// heuristic runs first when the grid carries no NaN marker. A constant
    /// raster (zero standard deviation or zero range) produces non-finite
    /// output values.
    pub fn scale<P: AsRef<Path>>(&self, raster_path: P) -> GeoResult<PathBuf> {
        log::info!("Applying {:?} scaling", self.method);

        let (mut grid, mut profile) = read_band(&raster_path, 1)?;
        apply_sentinel_heuristic(&mut grid);

        let scaled = match self.method {
            ScalingMethod::Normalize => {
                let mean = masked_mean(&grid);
                let std = masked_std(&grid, mean);
                log::debug!("mean = {}, std = {}", mean, std);
                grid.mapv(|value| (value - mean) / std)
            }
            ScalingMethod::Standardize => {
                let min = masked_min(&grid);
                let max = masked_max(&grid);
                log::debug!("min = {}, max = {}", min, max);
                grid.mapv(|value| (value - min) / (max - min))
            }
        };

        profile.nodata = Some(f64::NAN);

        let output = derived_path(&raster_path, self.method.output_suffix());
        write_geotiff(&scaled, &profile, &output)?;

        Ok(output)
    }
}

/// Mean over non-missing pixels; NaN when every pixel is missing
pub fn masked_mean(grid: &RasterGrid) -> f32 {
    let mut sum = 0.0_f64;
    let mut count = 0_usize;

    for &value in grid.iter() {
        if !value.is_nan() {
            sum += value as f64;
            count += 1;
        }
    }

    if count == 0 {
        f32::NAN
    } else {
        (sum / count as f64) as f32
    }
}

/// Population standard deviation over non-missing pixels
pub fn masked_std(grid: &RasterGrid, mean: f32) -> f32 {
    let mut sum_sq = 0.0_f64;
    let mut count = 0_usize;

    for &value in grid.iter() {
        if !value.is_nan() {
            let diff = value as f64 - mean as f64;
            sum_sq += diff * diff;
            count += 1;
        }
    }

    if count == 0 {
        f32::NAN
    } else {
        (sum_sq / count as f64).sqrt() as f32
    }
}

/// Minimum over non-missing pixels; NaN when every pixel is missing
pub fn masked_min(grid: &RasterGrid) -> f32 {
    grid.iter()
        .filter(|value| !value.is_nan())
        .fold(f32::NAN, |acc, &value| if acc.is_nan() { value } else { acc.min(value) })
}

/// Maximum over non-missing pixels; NaN when every pixel is missing
pub fn masked_max(grid: &RasterGrid) -> f32 {
    grid.iter()
        .filter(|value| !value.is_nan())
        .fold(f32::NAN, |acc, &value| if acc.is_nan() { value } else { acc.max(value) })
}
