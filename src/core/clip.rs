use crate::io::raster::{create_tiff_dataset, derived_path, read_band_window, read_profile, write_geotiff};
use crate::io::vector::{open_vector, read_geometries};
use crate::types::{GeoError, GeoResult, GeoTransform, RasterProfile};
use gdal::raster::rasterize;
use gdal::vector::Geometry;
use gdal::{Dataset, DriverManager};
use ndarray::{Array2, Zip};
use std::path::{Path, PathBuf};

/// Clip a raster to the footprint of a polygon boundary layer.
///
/// The output shrinks to the pixel window covering the union of the boundary
/// polygons; pixels outside the polygons are set to the canonical NaN marker.
/// Writes `<stem>_C.tif`.
///
/// The boundary and raster reference systems are not compared; a boundary in
/// a different reference system silently clips the wrong region.
pub fn clip_raster_by_boundary<P: AsRef<Path>, Q: AsRef<Path>>(
    raster_path: P,
    boundary_path: Q,
) -> GeoResult<PathBuf> {
    let boundary = open_vector(&boundary_path)?;
    let mut layer = boundary.layer(0)?;
    let geometries = read_geometries(&mut layer)?;

    log::debug!("Boundary layer holds {} geometries", geometries.len());

    let footprint = union_footprint(&geometries)?;

    let dataset = Dataset::open(raster_path.as_ref())?;
    let profile = read_profile(&dataset)?;

    let (x_off, y_off, width, height) = footprint_window(&footprint, &profile)?;
    log::info!(
        "Clipping to window x_off={}, y_off={}, {}x{} pixels",
        x_off,
        y_off,
        width,
        height
    );

    let window = read_band_window(&dataset, 1, x_off, y_off, width, height)?;

    let mut out_transform = profile.transform;
    let (origin_x, origin_y) = profile.transform.pixel_corner(x_off, y_off);
    out_transform.top_left_x = origin_x;
    out_transform.top_left_y = origin_y;

    let mask = rasterize_footprint(&footprint, width, height, &out_transform)?;

    let clipped = Zip::from(&window)
        .and(&mask)
        .map_collect(|&value, &inside| if inside == 0 { f32::NAN } else { value });

    let out_profile = RasterProfile {
        width,
        height,
        transform: out_transform,
        projection: profile.projection.clone(),
        nodata: Some(f64::NAN),
    };

    let output = derived_path(&raster_path, "_C.tif");
    write_geotiff(&clipped, &out_profile, &output)?;

    Ok(output)
}

/// Union all boundary geometries into one footprint
fn union_footprint(geometries: &[Geometry]) -> GeoResult<Geometry> {
    let mut footprint = geometries[0].clone();

    for geometry in &geometries[1..] {
        footprint = footprint
            .union(geometry)
            .ok_or_else(|| GeoError::Processing("Boundary union failed".to_string()))?;
    }

    Ok(footprint)
}

/// Pixel window covering the footprint envelope, clamped to the raster grid
fn footprint_window(
    footprint: &Geometry,
    profile: &RasterProfile,
) -> GeoResult<(usize, usize, usize, usize)> {
    let envelope = footprint.envelope();

    // Window corners from the envelope corners; a north-up transform maps
    // MaxY to the top row
    let (col0, row0) = profile.transform.world_to_pixel(envelope.MinX, envelope.MaxY);
    let (col1, row1) = profile.transform.world_to_pixel(envelope.MaxX, envelope.MinY);

    let x_min = col0.min(col1).floor().max(0.0) as usize;
    let y_min = row0.min(row1).floor().max(0.0) as usize;
    let x_max = (col0.max(col1).ceil() as usize).min(profile.width);
    let y_max = (row0.max(row1).ceil() as usize).min(profile.height);

    if x_min >= x_max || y_min >= y_max {
        return Err(GeoError::Processing(
            "Boundary does not overlap the raster extent".to_string(),
        ));
    }

    Ok((x_min, y_min, x_max - x_min, y_max - y_min))
}

/// Burn the footprint into an in-memory byte mask aligned with the window
fn rasterize_footprint(
    footprint: &Geometry,
    width: usize,
    height: usize,
    transform: &GeoTransform,
) -> GeoResult<Array2<u8>> {
    let driver = DriverManager::get_driver_by_name("MEM")?;
    let mut mask_dataset =
        driver.create_with_band_type::<u8, _>("", width as isize, height as isize, 1)?;
    mask_dataset.set_geo_transform(&transform.to_gdal())?;

    rasterize(
        &mut mask_dataset,
        &[1],
        &[footprint.clone()],
        &[1.0],
        None,
    )?;

    let buffer = mask_dataset.rasterband(1)?.read_as::<u8>(
        (0, 0),
        (width, height),
        (width, height),
        None,
    )?;

    Array2::from_shape_vec((height, width), buffer.data)
        .map_err(|e| GeoError::Processing(format!("Failed to reshape mask data: {}", e)))
}
