use geo::MultiPolygon;
use geojson::GeoJson;
use serde_json::Value;
use thiserror::Error;

/// A city block polygon with its socioeconomic stratum. Blocks without a
/// usable `ESTRATO` value stay in the layer but never contribute to a mean.
#[derive(Debug, Clone)]
pub struct StratumBlock {
    pub polygon: MultiPolygon<f64>,
    pub estrato: Option<f64>,
}

#[derive(Debug, Error)]
pub enum BlockLoadError {
    #[error("failed to parse block GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("block layer must be a GeoJSON FeatureCollection")]
    NotAFeatureCollection,

    #[error("feature {index} has no usable polygon geometry")]
    MissingGeometry { index: usize },

    #[error("feature {index} carries a non-numeric ESTRATO value")]
    InvalidStratum { index: usize },
}

/// Loads the stratum block layer from a GeoJSON `FeatureCollection`.
///
/// Every feature must carry a `Polygon` or `MultiPolygon` geometry. The
/// `ESTRATO` property is numeric and nullable; a null or absent value yields
/// a block with no stratum, while any other non-numeric value is a fatal
/// configuration error.
pub fn blocks_from_geojson(raw: &str) -> Result<Vec<StratumBlock>, BlockLoadError> {
    let parsed: GeoJson = raw.parse()?;
    let GeoJson::FeatureCollection(collection) = parsed else {
        return Err(BlockLoadError::NotAFeatureCollection);
    };

    let mut blocks = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            return Err(BlockLoadError::MissingGeometry { index });
        };
        let converted: geo::Geometry<f64> = geometry
            .try_into()
            .map_err(|_| BlockLoadError::MissingGeometry { index })?;
        let polygon = match converted {
            geo::Geometry::MultiPolygon(multi) => multi,
            geo::Geometry::Polygon(single) => MultiPolygon(vec![single]),
            _ => return Err(BlockLoadError::MissingGeometry { index }),
        };

        let estrato = match feature.properties.as_ref().and_then(|props| props.get("ESTRATO")) {
            None | Some(Value::Null) => None,
            Some(Value::Number(number)) => number.as_f64(),
            Some(_) => return Err(BlockLoadError::InvalidStratum { index }),
        };

        blocks.push(StratumBlock { polygon, estrato });
    }

    Ok(blocks)
}
