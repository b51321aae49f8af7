//! Decoding of route geometry returned by routing engines into `[lat, lon]` pairs.

use crate::constants::POLYLINE_PRECISION;
use geojson::GeoJson;
use serde_json::Value;

/// Decode whatever shape a routing engine used for its geometry.
///
/// Accepted: GeoJSON geometries, features and collections (first feature);
/// objects carrying a `coordinates` array; bare nested coordinate arrays;
/// JSON text of any of these; encoded polylines. Unusable input yields an
/// empty list.
pub fn parse_geometry(raw: &Value) -> Vec<[f64; 2]> {
    match raw {
        Value::Array(_) => {
            let mut pairs = Vec::new();
            collect_pairs(raw, &mut pairs);
            orient_pairs(pairs)
        }
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed) if !parsed.is_string() => parse_geometry(&parsed),
            _ => decode_polyline(text),
        },
        Value::Object(map) => {
            if let Ok(geojson) = GeoJson::from_json_value(raw.clone()) {
                return from_geojson(&geojson);
            }
            map.get("coordinates")
                .or_else(|| map.get("geometry").and_then(|g| g.get("coordinates")))
                .map(parse_geometry)
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Positions of a GeoJSON document, converted from `[lon, lat]`.
pub fn from_geojson(geojson: &GeoJson) -> Vec<[f64; 2]> {
    let geometry = match geojson {
        GeoJson::Geometry(g) => Some(g),
        GeoJson::Feature(f) => f.geometry.as_ref(),
        GeoJson::FeatureCollection(fc) => fc.features.first().and_then(|f| f.geometry.as_ref()),
    };

    let positions: Vec<Vec<f64>> = match geometry.map(|g| &g.value) {
        Some(geojson::Value::LineString(line)) => line.clone(),
        Some(geojson::Value::MultiLineString(lines)) => lines.concat(),
        Some(geojson::Value::MultiPoint(points)) => points.clone(),
        Some(geojson::Value::Point(point)) => vec![point.clone()],
        _ => Vec::new(),
    };

    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| [p[1], p[0]])
        .filter(|p| is_lat_lon(p))
        .collect()
}

fn decode_polyline(encoded: &str) -> Vec<[f64; 2]> {
    match polyline::decode_polyline(encoded, POLYLINE_PRECISION) {
        Ok(line) => line
            .coords()
            .map(|c| [c.y, c.x])
            .filter(is_lat_lon)
            .collect(),
        Err(e) => {
            tracing::debug!("Geometry string is neither JSON nor a polyline: {}", e);
            Vec::new()
        }
    }
}

fn collect_pairs(node: &Value, out: &mut Vec<[f64; 2]>) {
    let Value::Array(items) = node else {
        return;
    };

    if let [Value::Number(a), Value::Number(b), ..] = items.as_slice() {
        if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
            out.push([a, b]);
        }
        return;
    }

    for item in items {
        collect_pairs(item, out);
    }
}

/// Bare pairs carry no axis order; read them as `[lon, lat]` unless some
/// first component only fits a longitude range the other way round.
fn orient_pairs(pairs: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    let lat_first = pairs.iter().any(|p| p[1].abs() > 90.0) && pairs.iter().all(|p| p[0].abs() <= 90.0);

    pairs
        .into_iter()
        .map(|p| if lat_first { p } else { [p[1], p[0]] })
        .filter(is_lat_lon)
        .collect()
}

fn is_lat_lon(p: &[f64; 2]) -> bool {
    p[0].is_finite() && p[1].is_finite() && p[0].abs() <= 90.0 && p[1].abs() <= 180.0
}

/// Drop points equal to their predecessor.
pub fn dedupe_consecutive(points: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    let mut out: Vec<[f64; 2]> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// Append `segment` to `path`, skipping its first point when it repeats the last one.
pub fn append_segment(path: &mut Vec<[f64; 2]>, segment: Vec<[f64; 2]>) {
    let skip = match (path.last(), segment.first()) {
        (Some(last), Some(first)) => usize::from(last == first),
        _ => 0,
    };
    path.extend(segment.into_iter().skip(skip));
}
