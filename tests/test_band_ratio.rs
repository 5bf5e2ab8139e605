use approx::assert_relative_eq;
use cultivar::{read_band, BandRatioNormalizer, GeoError, RatioLayout};
use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::DriverManager;
use std::path::Path;
use tempfile::TempDir;

/// Write a 3-band float32 GeoTIFF fixture (R, G, B band order)
fn write_rgb_raster(path: &Path, bands: [&[f32]; 3], width: usize, height: usize) {
    let driver = DriverManager::get_driver_by_name("GTiff").expect("GTiff driver");
    let mut dataset = driver
        .create_with_band_type::<f32, _>(path, width as isize, height as isize, 3)
        .expect("create raster");

    dataset
        .set_geo_transform(&[0.0, 1.0, 0.0, height as f64, 0.0, -1.0])
        .expect("set transform");
    dataset
        .set_spatial_ref(&SpatialRef::from_epsg(31982).expect("srs"))
        .expect("set srs");

    for (i, band_data) in bands.iter().enumerate() {
        let buffer = Buffer::new((width, height), band_data.to_vec());
        dataset
            .rasterband(i as isize + 1)
            .expect("band")
            .write((0, 0), (width, height), &buffer)
            .expect("write band");
    }
}

#[test]
fn test_split_layout_writes_three_ratio_rasters() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("rgb.tif");

    let red = vec![10.0_f32; 12];
    let green = vec![20.0_f32; 12];
    let blue = vec![70.0_f32; 12];
    write_rgb_raster(&input, [&red, &green, &blue], 4, 3);

    let outputs = BandRatioNormalizer::new(RatioLayout::SplitBands)
        .normalize(&input)
        .expect("normalize");

    assert_eq!(
        outputs,
        [
            dir.path().join("rgb_R_N.tif"),
            dir.path().join("rgb_G_N.tif"),
            dir.path().join("rgb_B_N.tif"),
        ]
    );

    let expected = [0.1_f32, 0.2, 0.7];
    for (path, expected) in outputs.iter().zip(expected) {
        let (grid, profile) = read_band(path, 1).expect("read ratio");
        assert_eq!(grid.dim(), (3, 4));
        assert!(profile.nodata.map(|v| v.is_nan()).unwrap_or(false));
        for &value in grid.iter() {
            assert_relative_eq!(value, expected, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_stacked_layout_ratios_sum_to_one() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("ortho.tif");

    // Varying values, including one zero-sum pixel at index 0
    let red = vec![0.0_f32, 5.0, 10.0, 2.0, 8.0, 1.0];
    let green = vec![0.0_f32, 10.0, 30.0, 2.0, 8.0, 3.0];
    let blue = vec![0.0_f32, 85.0, 60.0, 4.0, 16.0, 4.0];
    write_rgb_raster(&input, [&red, &green, &blue], 3, 2);

    let outputs = BandRatioNormalizer::new(RatioLayout::Stacked)
        .normalize(&input)
        .expect("normalize");
    assert_eq!(outputs, [dir.path().join("ortho_N_.tif")]);

    let (ratio_r, _) = read_band(&outputs[0], 1).expect("band 1");
    let (ratio_g, _) = read_band(&outputs[0], 2).expect("band 2");
    let (ratio_b, _) = read_band(&outputs[0], 3).expect("band 3");

    // Band order is preserved: band 1 holds the red ratio
    assert_relative_eq!(ratio_r[[0, 1]], 0.05, epsilon = 1e-6);
    assert_relative_eq!(ratio_g[[0, 1]], 0.10, epsilon = 1e-6);
    assert_relative_eq!(ratio_b[[0, 1]], 0.85, epsilon = 1e-6);

    for ((r, g), b) in ratio_r.iter().zip(ratio_g.iter()).zip(ratio_b.iter()).skip(1) {
        assert_relative_eq!(r + g + b, 1.0, epsilon = 1e-5);
    }

    // R = G = B = 0 divides by zero; the ratio is non-finite
    assert!(!ratio_r[[0, 0]].is_finite());
    assert!(!ratio_g[[0, 0]].is_finite());
    assert!(!ratio_b[[0, 0]].is_finite());
}

#[test]
fn test_band_count_is_checked() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("single.tif");

    let driver = DriverManager::get_driver_by_name("GTiff").expect("GTiff driver");
    let mut dataset = driver
        .create_with_band_type::<f32, _>(&input, 2, 2, 1)
        .expect("create raster");
    dataset
        .set_geo_transform(&[0.0, 1.0, 0.0, 2.0, 0.0, -1.0])
        .expect("set transform");
    drop(dataset);

    let result = BandRatioNormalizer::new(RatioLayout::Stacked).normalize(&input);

    match result {
        Err(GeoError::InvalidFormat(message)) => {
            assert!(message.contains("3 bands"));
        }
        other => panic!("expected InvalidFormat, got {:?}", other),
    }
}
