use crate::io::raster::derived_path;
use crate::io::vector::{open_vector, schema_fields, write_feature_shapefile};
use crate::types::GeoResult;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, Geometry, LayerAccess};
use std::path::{Path, PathBuf};

/// Rewrite a vector layer's declared reference system.
///
/// Features are copied verbatim into a new layer tagged with the target EPSG
/// code; coordinates are NOT transformed. Assigning a reference system this
/// way only renames the one the coordinates are interpreted in, so geometries
/// that were valid in the old system end up misplaced in the new one unless
/// the two agree. Writes `<stem><epsg>.shp`.
pub fn rewrite_crs<P: AsRef<Path>>(layer_path: P, epsg: u32) -> GeoResult<PathBuf> {
    let dataset = open_vector(&layer_path)?;
    let mut layer = dataset.layer(0)?;

    let columns = schema_fields(&layer);

    let mut features: Vec<(Geometry, Vec<Option<FieldValue>>)> = Vec::new();
    for feature in layer.features() {
        let geometry = match feature.geometry() {
            Some(geometry) => geometry.clone(),
            None => {
                log::warn!("Feature {:?} carries no geometry, skipping", feature.fid());
                continue;
            }
        };

        let mut values = Vec::new();
        for field in &columns {
            values.push(feature.field(&field.name)?);
        }
        features.push((geometry, values));
    }

    log::info!(
        "Retagging {} features to EPSG:{} without coordinate transform",
        features.len(),
        epsg
    );

    let srs = SpatialRef::from_epsg(epsg)?;
    let output = derived_path(&layer_path, &format!("{}.shp", epsg));
    write_feature_shapefile(&output, Some(&srs), &columns, &features)?;

    Ok(output)
}
