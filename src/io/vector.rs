use crate::types::{BoundingBox, GeoError, GeoResult};
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, Geometry, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType};
use gdal::{Dataset, DriverManager};
use std::path::Path;

/// One attribute column of a layer schema
#[derive(Debug, Clone)]
pub struct FieldColumn {
    pub name: String,
    pub field_type: OGRFieldType::Type,
}

/// A point destined for a shapefile, carrying its source pixel value
#[derive(Debug, Clone, Copy)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
    pub value: f32,
}

/// Open a vector dataset for reading
pub fn open_vector<P: AsRef<Path>>(path: P) -> GeoResult<Dataset> {
    log::info!("Opening vector layer: {}", path.as_ref().display());
    Ok(Dataset::open(path.as_ref())?)
}

/// Human-readable label for a layer's reference system.
///
/// Prefers the authority code ("EPSG:31982"); falls back to the WKT string,
/// or "<none>" for layers without one.
pub fn crs_label(srs: Option<&SpatialRef>) -> String {
    match srs {
        Some(srs) => match srs.auth_code() {
            Ok(code) => format!("EPSG:{}", code),
            Err(_) => srs.to_wkt().unwrap_or_default(),
        },
        None => "<none>".to_string(),
    }
}

/// Collect the geometries of every feature in a layer
pub fn read_geometries(layer: &mut gdal::vector::Layer) -> GeoResult<Vec<Geometry>> {
    let mut geometries = Vec::new();

    for feature in layer.features() {
        match feature.geometry() {
            Some(geometry) => geometries.push(geometry.clone()),
            None => log::warn!("Feature {:?} carries no geometry, skipping", feature.fid()),
        }
    }

    if geometries.is_empty() {
        return Err(GeoError::InvalidFormat(
            "Vector layer contains no geometries".to_string(),
        ));
    }

    Ok(geometries)
}

/// Bounding extent of a layer
pub fn layer_extent(layer: &mut gdal::vector::Layer) -> GeoResult<BoundingBox> {
    let envelope = layer.get_extent()?;

    Ok(BoundingBox {
        min_x: envelope.MinX,
        max_x: envelope.MaxX,
        min_y: envelope.MinY,
        max_y: envelope.MaxY,
    })
}

/// Attribute schema of a layer
pub fn schema_fields(layer: &gdal::vector::Layer) -> Vec<FieldColumn> {
    layer
        .defn()
        .fields()
        .map(|field| FieldColumn {
            name: field.name(),
            field_type: field.field_type(),
        })
        .collect()
}

/// OGR column type able to hold a scalar field value.
///
/// List and date types are not carried through; the caller decides whether to
/// skip or stringify them.
pub fn scalar_field_type(value: &FieldValue) -> Option<OGRFieldType::Type> {
    match value {
        FieldValue::IntegerValue(_) => Some(OGRFieldType::OFTInteger),
        FieldValue::Integer64Value(_) => Some(OGRFieldType::OFTInteger64),
        FieldValue::RealValue(_) => Some(OGRFieldType::OFTReal),
        FieldValue::StringValue(_) => Some(OGRFieldType::OFTString),
        _ => None,
    }
}

/// Write point records to a new ESRI Shapefile with a single `value` column
pub fn write_point_shapefile<P: AsRef<Path>>(
    path: P,
    srs: Option<&SpatialRef>,
    points: &[PointRecord],
) -> GeoResult<()> {
    log::info!(
        "Writing {} points to {}",
        points.len(),
        path.as_ref().display()
    );

    let driver = DriverManager::get_driver_by_name("ESRI Shapefile")?;
    let mut dataset = driver.create_vector_only(path.as_ref())?;

    let mut layer = dataset.create_layer(LayerOptions {
        name: "points",
        srs,
        ty: OGRwkbGeometryType::wkbPoint,
        ..Default::default()
    })?;
    layer.create_defn_fields(&[("value", OGRFieldType::OFTReal)])?;

    for record in points {
        let mut geometry = Geometry::empty(OGRwkbGeometryType::wkbPoint)?;
        geometry.add_point_2d((record.x, record.y));

        layer.create_feature_fields(
            geometry,
            &["value"],
            &[FieldValue::RealValue(record.value as f64)],
        )?;
    }

    Ok(())
}

/// Write polygon features with attributes to a new ESRI Shapefile.
///
/// Each feature's values are aligned with `columns`; a `None` value leaves
/// that field unset.
pub fn write_feature_shapefile<P: AsRef<Path>>(
    path: P,
    srs: Option<&SpatialRef>,
    columns: &[FieldColumn],
    features: &[(Geometry, Vec<Option<FieldValue>>)],
) -> GeoResult<()> {
    log::info!(
        "Writing {} features to {}",
        features.len(),
        path.as_ref().display()
    );

    let driver = DriverManager::get_driver_by_name("ESRI Shapefile")?;
    let mut dataset = driver.create_vector_only(path.as_ref())?;

    let mut layer = dataset.create_layer(LayerOptions {
        name: "features",
        srs,
        ty: OGRwkbGeometryType::wkbUnknown,
        ..Default::default()
    })?;

    let defn: Vec<(&str, OGRFieldType::Type)> = columns
        .iter()
        .map(|column| (column.name.as_str(), column.field_type))
        .collect();
    layer.create_defn_fields(&defn)?;

    for (geometry, values) in features {
        let mut names: Vec<&str> = Vec::new();
        let mut set_values: Vec<FieldValue> = Vec::new();

        for (column, value) in columns.iter().zip(values) {
            if let Some(value) = value {
                names.push(column.name.as_str());
                set_values.push(value.clone());
            }
        }

        layer.create_feature_fields(geometry.clone(), &names, &set_values)?;
    }

    Ok(())
}
