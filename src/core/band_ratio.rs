use crate::io::raster::{create_tiff_dataset, derived_path, read_band_window, read_profile, write_band_window};
use crate::types::{GeoError, GeoResult, RasterGrid, TileWindow};
use gdal::Dataset;
use ndarray::Zip;
use std::path::{Path, PathBuf};

/// Output layout for band-ratio normalization
#[derive(Debug, Clone, Copy)]
pub enum RatioLayout {
    /// Three single-band rasters, one per ratio (`_R_N`, `_G_N`, `_B_N`)
    SplitBands,
    /// One three-band raster with bands replaced by their ratios (`_N_`)
    Stacked,
}

/// Per-pixel band-ratio normalization of 3-band (R, G, B) imagery.
///
/// Each band is divided by the per-pixel band sum, so the three ratios sum to
/// one wherever the band sum is non-zero. A pixel with R = G = B = 0 divides
/// by zero and the ratio is non-finite.
pub struct BandRatioNormalizer {
    layout: RatioLayout,
}

impl BandRatioNormalizer {
    pub fn new(layout: RatioLayout) -> Self {
        Self { layout }
    }

    /// Normalize a 3-band raster, processing one tile window at a time.
    ///
    /// Windows follow the source band's native block layout, so memory stays
    /// proportional to one block. Returns the written path(s), in R, G, B
    /// order for the split layout.
    pub fn normalize<P: AsRef<Path>>(&self, raster_path: P) -> GeoResult<Vec<PathBuf>> {
        log::info!(
            "Band-ratio normalization ({:?}) of {}",
            self.layout,
            raster_path.as_ref().display()
        );

        let dataset = Dataset::open(raster_path.as_ref())?;
        let band_count = dataset.raster_count();
        if band_count != 3 {
            return Err(GeoError::InvalidFormat(format!(
                "Band-ratio normalization requires exactly 3 bands, found {}",
                band_count
            )));
        }

        let profile = read_profile(&dataset)?;
        let (block_width, block_height) = dataset.rasterband(1)?.block_size();
        let windows = tile_grid(profile.width, profile.height, block_width, block_height);

        log::debug!(
            "Processing {} windows from {}x{} native blocks",
            windows.len(),
            block_width,
            block_height
        );

        match self.layout {
            RatioLayout::SplitBands => {
                let paths = vec![
                    derived_path(&raster_path, "_R_N.tif"),
                    derived_path(&raster_path, "_G_N.tif"),
                    derived_path(&raster_path, "_B_N.tif"),
                ];

                let mut outputs = Vec::new();
                for path in &paths {
                    outputs.push(create_tiff_dataset(
                        path,
                        profile.width,
                        profile.height,
                        1,
                        &profile.transform,
                        &profile.projection,
                    )?);
                }

                process_tiles(&dataset, &windows, |window, ratios| {
                    for (output, ratio) in outputs.iter_mut().zip(ratios) {
                        write_band_window(output, 1, window.x_off, window.y_off, ratio)?;
                    }
                    Ok(())
                })?;

                for output in &mut outputs {
                    output.rasterband(1)?.set_no_data_value(Some(f64::NAN))?;
                }

                Ok(paths)
            }
            RatioLayout::Stacked => {
                let path = derived_path(&raster_path, "_N_.tif");
                let mut output = create_tiff_dataset(
                    &path,
                    profile.width,
                    profile.height,
                    3,
                    &profile.transform,
                    &profile.projection,
                )?;

                process_tiles(&dataset, &windows, |window, ratios| {
                    for (band_index, ratio) in (1..=3).zip(ratios) {
                        write_band_window(&mut output, band_index, window.x_off, window.y_off, ratio)?;
                    }
                    Ok(())
                })?;

                for band_index in 1..=3 {
                    output.rasterband(band_index)?.set_no_data_value(Some(f64::NAN))?;
                }

                Ok(vec![path])
            }
        }
    }
}

/// Read each window's three bands, compute the ratios and hand them to the
/// layout-specific writer. One window is resident at a time.
fn process_tiles<F>(dataset: &Dataset, windows: &[TileWindow], mut write_tile: F) -> GeoResult<()>
where
    F: FnMut(&TileWindow, &[RasterGrid; 3]) -> GeoResult<()>,
{
    for window in windows {
        let red = read_band_window(dataset, 1, window.x_off, window.y_off, window.width, window.height)?;
        let green = read_band_window(dataset, 2, window.x_off, window.y_off, window.width, window.height)?;
        let blue = read_band_window(dataset, 3, window.x_off, window.y_off, window.width, window.height)?;

        let ratios = band_ratios(&red, &green, &blue);
        write_tile(window, &ratios)?;
    }

    Ok(())
}

/// Per-pixel fraction of the band sum, for each of the three bands
fn band_ratios(red: &RasterGrid, green: &RasterGrid, blue: &RasterGrid) -> [RasterGrid; 3] {
    let ratio_of = |band: &RasterGrid| {
        Zip::from(band)
            .and(red)
            .and(green)
            .and(blue)
            .map_collect(|&value, &r, &g, &b| value / (r + g + b))
    };

    [ratio_of(red), ratio_of(green), ratio_of(blue)]
}

/// Partition a raster grid into non-overlapping windows of the native block size
pub fn tile_grid(width: usize, height: usize, block_width: usize, block_height: usize) -> Vec<TileWindow> {
    let mut windows = Vec::new();
    if width == 0 || height == 0 || block_width == 0 || block_height == 0 {
        return windows;
    }

    for y_off in (0..height).step_by(block_height) {
        let window_height = block_height.min(height - y_off);

        for x_off in (0..width).step_by(block_width) {
            let window_width = block_width.min(width - x_off);

            windows.push(TileWindow {
                x_off,
                y_off,
                width: window_width,
                height: window_height,
            });
        }
    }

    windows
}
