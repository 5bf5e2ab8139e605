use crate::io::raster::derived_path;
use crate::io::vector::{
    crs_label, layer_extent, open_vector, schema_fields, write_feature_shapefile, FieldColumn,
};
use crate::types::{BoundingBox, GeoError, GeoResult};
use gdal::vector::{FieldValue, Geometry, LayerAccess};
use std::path::{Path, PathBuf};

/// Summary of an intersection overlay
#[derive(Debug, Clone)]
pub struct OverlaySummary {
    /// Column names of the output layer
    pub columns: Vec<String>,
    /// Bounding extent of the first input
    pub extent_left: BoundingBox,
    /// Bounding extent of the second input
    pub extent_right: BoundingBox,
    /// Bounding extent of the result
    pub extent_result: BoundingBox,
    /// Path of the written layer
    pub output: PathBuf,
}

/// Intersect two vector layers sharing a reference system.
///
/// Output features carry the geometric overlap of each intersecting pair,
/// with the attributes of both parents; colliding column names from the
/// second layer are suffixed `_2`. Writes `<stem of first input>_Inter.shp`.
///
/// Layers in different reference systems abort with `CrsMismatch` before any
/// output is produced.
pub fn intersect_layers<P: AsRef<Path>, Q: AsRef<Path>>(
    left_path: P,
    right_path: Q,
) -> GeoResult<OverlaySummary> {
    let left_dataset = open_vector(&left_path)?;
    let right_dataset = open_vector(&right_path)?;
    let mut left = left_dataset.layer(0)?;
    let mut right = right_dataset.layer(0)?;

    let left_crs = crs_label(left.spatial_ref().as_ref());
    let right_crs = crs_label(right.spatial_ref().as_ref());
    if left_crs != right_crs {
        log::error!(
            "Layers use different reference systems: {} vs {}",
            left_crs,
            right_crs
        );
        return Err(GeoError::CrsMismatch {
            left: left_crs,
            right: right_crs,
        });
    }

    let extent_left = layer_extent(&mut left)?;
    let extent_right = layer_extent(&mut right)?;

    let left_fields = schema_fields(&left);
    let right_fields = schema_fields(&right);
    let columns = merged_columns(&left_fields, &right_fields);

    // The second layer is held in memory while the first streams past it
    let mut right_features: Vec<(Geometry, Vec<Option<FieldValue>>)> = Vec::new();
    for feature in right.features() {
        let geometry = match feature.geometry() {
            Some(geometry) => geometry.clone(),
            None => continue,
        };

        let mut values = Vec::new();
        for field in &right_fields {
            values.push(feature.field(&field.name)?);
        }
        right_features.push((geometry, values));
    }

    let mut out_features: Vec<(Geometry, Vec<Option<FieldValue>>)> = Vec::new();
    let mut extent_result = BoundingBox::empty();

    for feature in left.features() {
        let left_geometry = match feature.geometry() {
            Some(geometry) => geometry.clone(),
            None => continue,
        };

        let mut left_values = Vec::new();
        for field in &left_fields {
            left_values.push(feature.field(&field.name)?);
        }

        for (right_geometry, right_values) in &right_features {
            if !left_geometry.intersects(right_geometry) {
                continue;
            }

            let overlap = match left_geometry.intersection(right_geometry) {
                Some(overlap) => overlap,
                None => continue,
            };
            if overlap.is_empty() {
                continue;
            }

            let envelope = overlap.envelope();
            extent_result.expand(&BoundingBox {
                min_x: envelope.MinX,
                max_x: envelope.MaxX,
                min_y: envelope.MinY,
                max_y: envelope.MaxY,
            });

            let mut values = left_values.clone();
            values.extend(right_values.iter().cloned());
            out_features.push((overlap, values));
        }
    }

    log::info!("Intersection produced {} features", out_features.len());

    let output = derived_path(&left_path, "_Inter.shp");
    write_feature_shapefile(&output, left.spatial_ref().as_ref(), &columns, &out_features)?;

    Ok(OverlaySummary {
        columns: columns.into_iter().map(|column| column.name).collect(),
        extent_left,
        extent_right,
        extent_result,
        output,
    })
}

/// Merge two layer schemas; colliding names from the right layer get `_2`
fn merged_columns(left: &[FieldColumn], right: &[FieldColumn]) -> Vec<FieldColumn> {
    let mut columns = left.to_vec();

    for field in right {
        let name = if left.iter().any(|column| column.name == field.name) {
            format!("{}_2", field.name)
        } else {
            field.name.clone()
        };

        columns.push(FieldColumn {
            name,
            field_type: field.field_type,
        });
    }

    columns
}
