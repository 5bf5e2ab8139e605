use crate::io::raster::{derived_path, read_band, write_geotiff};
use crate::types::{GeoResult, RasterGrid};
use std::path::{Path, PathBuf};

/// True when the grid already carries the canonical NaN missing-value marker
pub fn has_canonical_marker(grid: &RasterGrid) -> bool {
    grid.iter().any(|value| value.is_nan())
}

/// Replace an implicit no-data sentinel with the canonical NaN marker.
///
/// Grids without any NaN pixel are assumed to encode missing values with the
/// value found at grid position (0, 0); every pixel equal to it is rewritten
/// to NaN. Returns the sentinel when the heuristic fired.
///
/// Known false positive: legitimate data elsewhere in the grid that happens to
/// equal the (0, 0) value is nulled along with the border fill.
pub fn apply_sentinel_heuristic(grid: &mut RasterGrid) -> Option<f32> {
    if grid.is_empty() || has_canonical_marker(grid) {
        return None;
    }

    let sentinel = grid[[0, 0]];
    grid.mapv_inplace(|value| if value == sentinel { f32::NAN } else { value });

    log::warn!(
        "No NaN marker found; treating top-left value {} as the no-data sentinel",
        sentinel
    );

    Some(sentinel)
}

/// Rewrite a raster whose no-data marker is implicit into one with the
/// canonical marker, writing `<stem>_Cor.tif`.
///
/// A raster that already contains NaN pixels is copied through unchanged
/// apart from the nodata metadata.
pub fn correct_nodata<P: AsRef<Path>>(raster_path: P) -> GeoResult<PathBuf> {
    let (mut grid, mut profile) = read_band(&raster_path, 1)?;

    match apply_sentinel_heuristic(&mut grid) {
        Some(sentinel) => log::info!("Rewrote sentinel {} to NaN", sentinel),
        None => log::debug!("Canonical marker already present, grid left unchanged"),
    }

    profile.nodata = Some(f64::NAN);

    let output = derived_path(&raster_path, "_Cor.tif");
    write_geotiff(&grid, &profile, &output)?;

    Ok(output)
}
