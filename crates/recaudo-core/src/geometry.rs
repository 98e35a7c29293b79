use geo::{LineString, Point, Polygon};
use geojson::{GeoJson, Geometry, Value};

const CIRCLE_SEGMENTS: usize = 32;

/// Encodes a station location as a GeoJSON point geometry string.
/// Coordinates follow the (x, y) convention: longitude first.
pub fn encode_point(longitude: f64, latitude: f64) -> String {
    Geometry::new(Value::Point(vec![longitude, latitude])).to_string()
}

/// Parses a GeoJSON geometry string back into a point. Returns `None` for
/// anything that is not a well-formed point geometry.
pub fn decode_point(raw: &str) -> Option<Point<f64>> {
    let parsed: GeoJson = raw.parse().ok()?;
    let GeoJson::Geometry(geometry) = parsed else {
        return None;
    };
    let converted: geo::Geometry<f64> = geometry.try_into().ok()?;
    match converted {
        geo::Geometry::Point(point) => Some(point),
        _ => None,
    }
}

/// Approximates a circular catchment area around a station point as a
/// closed 32-segment ring, in the same angular units as the input.
pub fn catchment_polygon(center: Point<f64>, radius: f64) -> Polygon<f64> {
    let mut ring = Vec::with_capacity(CIRCLE_SEGMENTS + 1);
    for segment in 0..=CIRCLE_SEGMENTS {
        let theta = 2.0 * std::f64::consts::PI * (segment as f64) / (CIRCLE_SEGMENTS as f64);
        ring.push((
            center.x() + radius * theta.cos(),
            center.y() + radius * theta.sin(),
        ));
    }
    Polygon::new(LineString::from(ring), vec![])
}
