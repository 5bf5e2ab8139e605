use crate::types::{GeoError, GeoResult, GeoTransform, RasterGrid, RasterProfile};
use gdal::raster::{Buffer, RasterCreationOption};
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Derive an output path from an input path by stripping the extension and
/// appending an operation suffix.
///
/// The last four characters of the path are assumed to be a dot plus a
/// three-letter extension (".tif", ".shp"); anything else gets truncated.
pub fn derived_path<P: AsRef<Path>>(input: P, suffix: &str) -> PathBuf {
    let raw = input.as_ref().to_string_lossy();
    let cut = raw
        .char_indices()
        .rev()
        .nth(3)
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    PathBuf::from(format!("{}{}", &raw[..cut], suffix))
}

/// Read the georeferencing metadata of an open dataset
pub fn read_profile(dataset: &Dataset) -> GeoResult<RasterProfile> {
    let (width, height) = dataset.raster_size();
    let transform = GeoTransform::from_gdal(dataset.geo_transform()?);
    let nodata = dataset.rasterband(1)?.no_data_value();

    Ok(RasterProfile {
        width,
        height,
        transform,
        projection: dataset.projection(),
        nodata,
    })
}

/// Read one band of a raster file into a grid, along with its profile
pub fn read_band<P: AsRef<Path>>(path: P, band_index: isize) -> GeoResult<(RasterGrid, RasterProfile)> {
    log::info!("Opening raster: {}", path.as_ref().display());

    let dataset = Dataset::open(path.as_ref())?;
    let profile = read_profile(&dataset)?;

    let rasterband = dataset.rasterband(band_index)?;
    let buffer = rasterband.read_as::<f32>(
        (0, 0),
        (profile.width, profile.height),
        (profile.width, profile.height),
        None,
    )?;

    let grid = Array2::from_shape_vec((profile.height, profile.width), buffer.data)
        .map_err(|e| GeoError::Processing(format!("Failed to reshape raster data: {}", e)))?;

    log::debug!("Read band {}: {}x{} pixels", band_index, profile.width, profile.height);

    Ok((grid, profile))
}

/// Read a rectangular window of one band into a grid
pub fn read_band_window(
    dataset: &Dataset,
    band_index: isize,
    x_off: usize,
    y_off: usize,
    width: usize,
    height: usize,
) -> GeoResult<RasterGrid> {
    let rasterband = dataset.rasterband(band_index)?;
    let buffer = rasterband.read_as::<f32>(
        (x_off as isize, y_off as isize),
        (width, height),
        (width, height),
        None,
    )?;

    Array2::from_shape_vec((height, width), buffer.data)
        .map_err(|e| GeoError::Processing(format!("Failed to reshape window data: {}", e)))
}

/// Create a float32 GeoTIFF dataset with LZW compression, ready for band writes
pub fn create_tiff_dataset<P: AsRef<Path>>(
    path: P,
    width: usize,
    height: usize,
    bands: isize,
    transform: &GeoTransform,
    projection: &str,
) -> GeoResult<Dataset> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let options = [RasterCreationOption {
        key: "COMPRESS",
        value: "LZW",
    }];

    let mut dataset = driver.create_with_band_type_with_options::<f32, _>(
        path.as_ref(),
        width as isize,
        height as isize,
        bands,
        &options,
    )?;

    dataset.set_geo_transform(&transform.to_gdal())?;
    if !projection.is_empty() {
        dataset.set_projection(projection)?;
    }

    Ok(dataset)
}

/// Write one grid into a band of an open dataset, at a window offset
pub fn write_band_window(
    dataset: &mut Dataset,
    band_index: isize,
    x_off: usize,
    y_off: usize,
    grid: &RasterGrid,
) -> GeoResult<()> {
    let (height, width) = grid.dim();
    let mut rasterband = dataset.rasterband(band_index)?;

    let flat: Vec<f32> = grid.iter().cloned().collect();
    let buffer = Buffer::new((width, height), flat);
    rasterband.write((x_off as isize, y_off as isize), (width, height), &buffer)?;

    Ok(())
}

/// Save a single-band grid as a compressed float32 GeoTIFF.
///
/// The file's nodata marker is set to NaN, the canonical in-grid marker.
pub fn write_geotiff<P: AsRef<Path>>(
    grid: &RasterGrid,
    profile: &RasterProfile,
    path: P,
) -> GeoResult<()> {
    log::info!("Saving raster: {}", path.as_ref().display());

    let (height, width) = grid.dim();
    let mut dataset = create_tiff_dataset(
        path.as_ref(),
        width,
        height,
        1,
        &profile.transform,
        &profile.projection,
    )?;

    write_band_window(&mut dataset, 1, 0, 0, grid)?;
    dataset
        .rasterband(1)?
        .set_no_data_value(Some(f32::NAN as f64))?;

    log::debug!("Wrote {}x{} pixels", width, height);

    Ok(())
}
