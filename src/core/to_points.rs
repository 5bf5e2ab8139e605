use crate::core::nodata::apply_sentinel_heuristic;
use crate::io::raster::{derived_path, read_band};
use crate::io::vector::{write_point_shapefile, PointRecord};
use crate::types::GeoResult;
use gdal::spatial_ref::SpatialRef;
use std::path::{Path, PathBuf};

/// Convert a single-band raster to a point layer, one point per valid pixel.
///
/// Points sit at pixel centroids (transform of col + 0.5, row + 0.5) and carry
/// the pixel value in a `value` column. Missing pixels are skipped, so the
/// point count equals the count of non-missing pixels; ordering follows the
/// row-major pixel scan.
pub fn raster_to_points<P: AsRef<Path>>(raster_path: P) -> GeoResult<PathBuf> {
    let (mut grid, profile) = read_band(&raster_path, 1)?;
    apply_sentinel_heuristic(&mut grid);

    let mut points = Vec::new();
    for ((row, col), &value) in grid.indexed_iter() {
        if value.is_nan() {
            continue;
        }

        let (x, y) = profile.transform.pixel_center(col, row);
        points.push(PointRecord { x, y, value });
    }

    log::info!(
        "Collected {} points from {} pixels",
        points.len(),
        grid.len()
    );

    let srs = if profile.projection.is_empty() {
        None
    } else {
        Some(SpatialRef::from_wkt(&profile.projection)?)
    };

    let output = derived_path(&raster_path, ".shp");
    write_point_shapefile(&output, srs.as_ref(), &points)?;

    Ok(output)
}
