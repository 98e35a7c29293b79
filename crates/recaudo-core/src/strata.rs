use std::collections::HashMap;

use geo::{BoundingRect, Intersects};
use polars::df;
use polars::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use thiserror::Error;
use tracing::debug;

use crate::blocks::StratumBlock;
use crate::geometry::{catchment_polygon, decode_point};
use crate::stations::{clean_stations, StationCleanError};

/// Catchment radius in degrees. 0.001 deg is roughly 111 m at this latitude.
pub const CATCHMENT_RADIUS_DEG: f64 = 0.005;

/// Stations that intersect no block sit outside the covered metro region, in
/// a single suburb whose stratum is known from field work to be 1.
pub const STRATUM_OUTSIDE_COVERAGE: f64 = 1.0;

#[derive(Debug, Error)]
pub enum StrataAssignError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),

    #[error("station cleaning failed: {0}")]
    Stations(#[from] StationCleanError),
}

struct BlockEntry<'a> {
    envelope: AABB<[f64; 2]>,
    block: &'a StratumBlock,
}

impl RTreeObject for BlockEntry<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

struct StationAgg {
    recaudoestacion: Option<String>,
    nombreestacion: Option<String>,
    latitud: Option<f64>,
    longitud: Option<f64>,
    geometry: Option<String>,
    stratum_sum: f64,
    stratum_count: usize,
}

/// Cleans the raw station table and assigns each distinct `idestacion` the
/// rounded mean stratum of every block its catchment area intersects.
///
/// The join is a left spatial intersection: each station row is buffered by
/// [`CATCHMENT_RADIUS_DEG`] and matched against every intersecting block.
/// Blocks with a null stratum never enter the mean. Stations matching no
/// block default to [`STRATUM_OUTSIDE_COVERAGE`]. Rounding is `f64::round`
/// (half away from zero). Output rows are sorted by `idestacion` ascending.
pub fn assign_strata(
    raw_stations: &DataFrame,
    blocks: &[StratumBlock],
) -> Result<DataFrame, StrataAssignError> {
    let stations = clean_stations(raw_stations)?;

    let tree = RTree::bulk_load(
        blocks
            .iter()
            .map(|block| BlockEntry {
                envelope: block_envelope(block),
                block,
            })
            .collect(),
    );

    let ids = stations.column("idestacion")?.str()?;
    let codes = stations.column("recaudoestacion")?.str()?;
    let names = stations.column("nombreestacion")?.str()?;
    let latitudes = stations.column("latitud")?.f64()?;
    let longitudes = stations.column("longitud")?.f64()?;
    let geometries = stations.column("geometry")?.str()?;

    let mut groups: HashMap<String, StationAgg> = HashMap::new();

    for idx in 0..stations.height() {
        // Rows without a group key are dropped, matching grouped semantics.
        let Some(id) = ids.get(idx) else {
            continue;
        };

        let agg = groups
            .entry(id.to_string())
            .or_insert_with(|| StationAgg {
                recaudoestacion: codes.get(idx).map(str::to_string),
                nombreestacion: names.get(idx).map(str::to_string),
                latitud: latitudes.get(idx),
                longitud: longitudes.get(idx),
                geometry: geometries.get(idx).map(str::to_string),
                stratum_sum: 0.0,
                stratum_count: 0,
            });

        let Some(point) = geometries.get(idx).and_then(decode_point) else {
            continue;
        };
        let catchment = catchment_polygon(point, CATCHMENT_RADIUS_DEG);
        let query = AABB::from_corners(
            [point.x() - CATCHMENT_RADIUS_DEG, point.y() - CATCHMENT_RADIUS_DEG],
            [point.x() + CATCHMENT_RADIUS_DEG, point.y() + CATCHMENT_RADIUS_DEG],
        );

        for entry in tree.locate_in_envelope_intersecting(&query) {
            if catchment.intersects(&entry.block.polygon) {
                if let Some(estrato) = entry.block.estrato {
                    agg.stratum_sum += estrato;
                    agg.stratum_count += 1;
                }
            }
        }
    }

    let mut rows: Vec<(String, StationAgg)> = groups.into_iter().collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out_ids = Vec::with_capacity(rows.len());
    let mut out_codes = Vec::with_capacity(rows.len());
    let mut out_names = Vec::with_capacity(rows.len());
    let mut out_strata: Vec<i32> = Vec::with_capacity(rows.len());
    let mut out_latitudes = Vec::with_capacity(rows.len());
    let mut out_longitudes = Vec::with_capacity(rows.len());
    let mut out_geometries = Vec::with_capacity(rows.len());

    for (id, agg) in rows {
        let estrato = if agg.stratum_count == 0 {
            STRATUM_OUTSIDE_COVERAGE
        } else {
            agg.stratum_sum / agg.stratum_count as f64
        };
        out_ids.push(id);
        out_codes.push(agg.recaudoestacion);
        out_names.push(agg.nombreestacion);
        out_strata.push(estrato.round() as i32);
        out_latitudes.push(agg.latitud);
        out_longitudes.push(agg.longitud);
        out_geometries.push(agg.geometry);
    }

    debug!(
        stations = stations.height(),
        blocks = blocks.len(),
        groups = out_ids.len(),
        "assigned strata to stations"
    );

    let out = df![
        "idestacion" => out_ids,
        "recaudoestacion" => out_codes,
        "nombreestacion" => out_names,
        "ESTRATO" => out_strata,
        "latitud" => out_latitudes,
        "longitud" => out_longitudes,
        "geometry" => out_geometries,
    ]?;

    Ok(out)
}

fn block_envelope(block: &StratumBlock) -> AABB<[f64; 2]> {
    block.polygon.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
