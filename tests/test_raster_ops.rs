use approx::assert_relative_eq;
use cultivar::core::scale::{masked_mean, masked_std};
use cultivar::{
    clip_raster_by_boundary, correct_nodata, derived_path, raster_to_points, read_band,
    RasterScaler, ScalingMethod,
};
use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, Geometry, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType};
use gdal::{Dataset, DriverManager};
use std::path::Path;
use tempfile::TempDir;

/// Write a single-band float32 GeoTIFF fixture with a 1-unit north-up grid
fn write_test_raster(path: &Path, data: &[f32], width: usize, height: usize) {
    let driver = DriverManager::get_driver_by_name("GTiff").expect("GTiff driver");
    let mut dataset = driver
        .create_with_band_type::<f32, _>(path, width as isize, height as isize, 1)
        .expect("create raster");

    dataset
        .set_geo_transform(&[0.0, 1.0, 0.0, height as f64, 0.0, -1.0])
        .expect("set transform");
    dataset
        .set_spatial_ref(&SpatialRef::from_epsg(31982).expect("srs"))
        .expect("set srs");

    let buffer = Buffer::new((width, height), data.to_vec());
    dataset
        .rasterband(1)
        .expect("band")
        .write((0, 0), (width, height), &buffer)
        .expect("write band");
}

/// Write a shapefile of axis-aligned square polygons
fn write_square_boundary(path: &Path, squares: &[(f64, f64, f64, f64)]) {
    let driver = DriverManager::get_driver_by_name("ESRI Shapefile").expect("shp driver");
    let mut dataset = driver.create_vector_only(path).expect("create shp");
    let srs = SpatialRef::from_epsg(31982).expect("srs");

    let mut layer = dataset
        .create_layer(LayerOptions {
            name: "boundary",
            srs: Some(&srs),
            ty: OGRwkbGeometryType::wkbPolygon,
            ..Default::default()
        })
        .expect("create layer");
    layer
        .create_defn_fields(&[("plot", OGRFieldType::OFTReal)])
        .expect("create fields");

    for (i, (min_x, min_y, max_x, max_y)) in squares.iter().enumerate() {
        let wkt = format!(
            "POLYGON(({min_x} {min_y}, {max_x} {min_y}, {max_x} {max_y}, {min_x} {max_y}, {min_x} {min_y}))"
        );
        let geometry = Geometry::from_wkt(&wkt).expect("polygon wkt");
        layer
            .create_feature_fields(geometry, &["plot"], &[FieldValue::RealValue(i as f64 + 1.0)])
            .expect("create feature");
    }
}

#[test]
fn test_correct_nodata_rewrites_sentinel() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("field.tif");

    // -9999 fill at (0,0) and one interior pixel, no NaN anywhere
    let data = vec![-9999.0, 1.0, 2.0, 3.0, -9999.0, 5.0, 6.0, 7.0, 8.0];
    write_test_raster(&input, &data, 3, 3);

    let output = correct_nodata(&input).expect("correct nodata");
    assert_eq!(output, dir.path().join("field_Cor.tif"));

    let (grid, profile) = read_band(&output, 1).expect("read output");
    assert_eq!(grid.len(), 9);
    assert!(grid[[0, 0]].is_nan());
    assert!(grid[[1, 1]].is_nan());
    assert_eq!(grid[[0, 1]], 1.0);
    assert_eq!(grid[[2, 2]], 8.0);
    assert_eq!(grid.iter().filter(|v| !v.is_nan()).count(), 7);
    assert!(profile.nodata.map(|v| v.is_nan()).unwrap_or(false));
}

#[test]
fn test_correct_nodata_leaves_marked_raster_unchanged() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("marked.tif");

    let data = vec![5.0, f32::NAN, 5.0, 2.0];
    write_test_raster(&input, &data, 2, 2);

    let output = correct_nodata(&input).expect("correct nodata");
    let (grid, _) = read_band(&output, 1).expect("read output");

    // The 5.0 pixels survive even though (0,0) equals them
    assert_eq!(grid[[0, 0]], 5.0);
    assert_eq!(grid[[1, 0]], 5.0);
    assert!(grid[[0, 1]].is_nan());
}

#[test]
fn test_normalize_border_marker_example() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("plot.tif");

    // 4x4 grid, -9999 marker at the four corners, 12 valid pixels
    #[rustfmt::skip]
    let data = vec![
        -9999.0, 1.0, 2.0, -9999.0,
        3.0, 4.0, 5.0, 6.0,
        7.0, 8.0, 9.0, 10.0,
        -9999.0, 11.0, 12.0, -9999.0,
    ];
    write_test_raster(&input, &data, 4, 4);

    let output = RasterScaler::new(ScalingMethod::Normalize)
        .scale(&input)
        .expect("normalize");
    assert_eq!(output, dir.path().join("plot_Normalized.tif"));

    let (grid, _) = read_band(&output, 1).expect("read output");

    // Expected statistics over the 12 valid pixels
    let valid: Vec<f32> = data.iter().cloned().filter(|v| *v != -9999.0).collect();
    let mean = valid.iter().sum::<f32>() / valid.len() as f32;
    let std = (valid.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / valid.len() as f32).sqrt();

    assert_relative_eq!(grid[[1, 0]], (3.0 - mean) / std, epsilon = 1e-5);
    assert_relative_eq!(grid[[2, 3]], (10.0 - mean) / std, epsilon = 1e-5);
    assert!(grid[[0, 0]].is_nan());
    assert!(grid[[3, 3]].is_nan());

    assert_relative_eq!(masked_mean(&grid), 0.0, epsilon = 1e-5);
    assert_relative_eq!(masked_std(&grid, 0.0), 1.0, epsilon = 1e-5);
}

#[test]
fn test_standardize_spans_unit_interval() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("ndvi.tif");

    let data = vec![-9999.0, 10.0, 20.0, 30.0, 40.0, 50.0];
    write_test_raster(&input, &data, 3, 2);

    let output = RasterScaler::new(ScalingMethod::Standardize)
        .scale(&input)
        .expect("standardize");
    assert_eq!(output, dir.path().join("ndvi_Stand.tif"));

    let (grid, _) = read_band(&output, 1).expect("read output");
    let valid: Vec<f32> = grid.iter().cloned().filter(|v| !v.is_nan()).collect();

    assert_eq!(valid.len(), 5);
    assert!(valid.iter().all(|v| (0.0..=1.0).contains(v)));
    assert_relative_eq!(valid.iter().cloned().fold(f32::INFINITY, f32::min), 0.0);
    assert_relative_eq!(valid.iter().cloned().fold(f32::NEG_INFINITY, f32::max), 1.0);
}

#[test]
fn test_standardize_constant_raster_is_non_finite() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("flat.tif");

    // One NaN keeps the sentinel heuristic quiet; the rest is constant
    let data = vec![f32::NAN, 5.0, 5.0, 5.0];
    write_test_raster(&input, &data, 2, 2);

    let output = RasterScaler::new(ScalingMethod::Standardize)
        .scale(&input)
        .expect("standardize");

    let (grid, _) = read_band(&output, 1).expect("read output");
    // Zero range divides by zero; nothing masks it
    assert!(grid.iter().all(|v| !v.is_finite()));
}

#[test]
fn test_raster_to_points_count_values_and_centroids() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("yield.tif");

    let data = vec![1.5, -9999.0, 3.5, 4.5];
    write_test_raster(&input, &data, 2, 2);

    let output = raster_to_points(&input).expect("to points");
    assert_eq!(output, dir.path().join("yield.shp"));

    let dataset = Dataset::open(&output).expect("open points");
    let mut layer = dataset.layer(0).expect("layer");

    let mut records = Vec::new();
    for feature in layer.features() {
        let geometry = feature.geometry().expect("point geometry");
        let (x, y, _) = geometry.get_point(0);
        let value = match feature.field("value").expect("value field") {
            Some(FieldValue::RealValue(v)) => v,
            other => panic!("unexpected field value {:?}", other),
        };
        records.push((x, y, value));
    }

    // One point per valid pixel, row-major order
    assert_eq!(records.len(), 3);

    // Pixel (0,0): centroid at transform * (0.5, 0.5) with top_left_y = 2
    assert_relative_eq!(records[0].0, 0.5, epsilon = 1e-10);
    assert_relative_eq!(records[0].1, 1.5, epsilon = 1e-10);
    assert_relative_eq!(records[0].2, 1.5, epsilon = 1e-6);

    // Row 1 follows
    assert_relative_eq!(records[1].0, 0.5, epsilon = 1e-10);
    assert_relative_eq!(records[1].1, 0.5, epsilon = 1e-10);
    assert_relative_eq!(records[1].2, 3.5, epsilon = 1e-6);
    assert_relative_eq!(records[2].2, 4.5, epsilon = 1e-6);
}

#[test]
fn test_clip_with_full_extent_boundary_is_identity() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scene.tif");
    let boundary = dir.path().join("farm.shp");

    let data: Vec<f32> = (1..=16).map(|v| v as f32).collect();
    write_test_raster(&input, &data, 4, 4);
    write_square_boundary(&boundary, &[(0.0, 0.0, 4.0, 4.0)]);

    let output = clip_raster_by_boundary(&input, &boundary).expect("clip");
    assert_eq!(output, derived_path(&input, "_C.tif"));

    let (original, original_profile) = read_band(&input, 1).expect("read input");
    let (clipped, clipped_profile) = read_band(&output, 1).expect("read output");

    assert_eq!(clipped.dim(), original.dim());
    assert_eq!(clipped_profile.transform, original_profile.transform);
    for (a, b) in original.iter().zip(clipped.iter()) {
        assert_eq!(a, b);
    }
}

#[test]
fn test_clip_masks_pixels_outside_boundary() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scene.tif");
    let boundary = dir.path().join("plots.shp");

    let data: Vec<f32> = (1..=16).map(|v| v as f32).collect();
    write_test_raster(&input, &data, 4, 4);

    // Two 1x1 plots at opposite corners; the window spans the full grid but
    // everything between them is outside the union
    write_square_boundary(&boundary, &[(0.0, 3.0, 1.0, 4.0), (3.0, 0.0, 4.0, 1.0)]);

    let output = clip_raster_by_boundary(&input, &boundary).expect("clip");
    let (clipped, _) = read_band(&output, 1).expect("read output");

    assert_eq!(clipped.dim(), (4, 4));
    assert_eq!(clipped[[0, 0]], 1.0);
    assert_eq!(clipped[[3, 3]], 16.0);
    assert!(clipped[[1, 1]].is_nan());
    assert!(clipped[[2, 2]].is_nan());
    assert_eq!(clipped.iter().filter(|v| !v.is_nan()).count(), 2);
}
