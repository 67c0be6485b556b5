//! TopoJSON → country features.
//!
//! Only the pieces country datasets use: polygon and multipolygon geometries,
//! shared arcs, and the optional quantization transform.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    lenient_rings, null_as_default, CountryCollection, CountryFeature, CountryProperties,
    DatasetError, DatasetResult, Geometry, Position, Ring,
};

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default, deserialize_with = "lenient_rings")]
    arcs: Vec<Vec<Position>>,
    #[serde(default)]
    objects: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    GeometryCollection {
        #[serde(default)]
        geometries: Vec<Value>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default, deserialize_with = "null_as_default")]
        properties: CountryProperties,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default, deserialize_with = "null_as_default")]
        properties: CountryProperties,
    },
    #[serde(other)]
    Other,
}

pub(crate) fn decode(value: Value) -> DatasetResult<CountryCollection> {
    let topology: Topology = serde_json::from_value(value)?;
    let Some((_, object)) = topology.objects.into_iter().next() else {
        return Ok(CountryCollection::empty());
    };
    let arcs = decode_arcs(&topology.arcs, topology.transform);

    let mut features = Vec::new();
    collect_features(object, &arcs, &mut features);
    Ok(CountryCollection { features })
}

/// Walk one geometry object. Geometries that cannot be read (including a
/// `null` type, which TopoJSON allows) or that reference missing arcs are
/// skipped on their own.
fn collect_features(value: Value, arcs: &[Vec<Position>], out: &mut Vec<CountryFeature>) {
    let geometry = match serde_json::from_value::<TopoGeometry>(value) {
        Ok(geometry) => geometry,
        Err(err) => {
            debug!("skipping unreadable topology geometry: {err}");
            return;
        }
    };
    if let TopoGeometry::GeometryCollection { geometries } = geometry {
        for child in geometries {
            collect_features(child, arcs, out);
        }
        return;
    }
    match feature(geometry, arcs) {
        Ok(Some(country)) => out.push(country),
        Ok(None) => {}
        Err(err) => debug!("skipping topology geometry: {err}"),
    }
}

fn feature(
    geometry: TopoGeometry,
    arcs: &[Vec<Position>],
) -> DatasetResult<Option<CountryFeature>> {
    Ok(match geometry {
        TopoGeometry::Polygon {
            arcs: rings,
            properties,
        } => Some(CountryFeature {
            properties,
            geometry: Some(Geometry::Polygon {
                coordinates: polygon(&rings, arcs)?,
            }),
        }),
        TopoGeometry::MultiPolygon {
            arcs: polygons,
            properties,
        } => {
            let coordinates = polygons
                .iter()
                .map(|rings| polygon(rings, arcs))
                .collect::<DatasetResult<Vec<_>>>()?;
            Some(CountryFeature {
                properties,
                geometry: Some(Geometry::MultiPolygon { coordinates }),
            })
        }
        TopoGeometry::GeometryCollection { .. } | TopoGeometry::Other => None,
    })
}

/// Resolve delta encoding and quantization once for every arc.
fn decode_arcs(raw: &[Vec<Position>], transform: Option<Transform>) -> Vec<Vec<Position>> {
    raw.iter()
        .map(|arc| match transform {
            Some(t) => {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| {
                        x += p[0];
                        y += p[1];
                        vec![
                            x * t.scale[0] + t.translate[0],
                            y * t.scale[1] + t.translate[1],
                        ]
                    })
                    .collect()
            }
            None => arc.clone(),
        })
        .collect()
}

fn polygon(rings: &[Vec<i64>], arcs: &[Vec<Position>]) -> DatasetResult<Vec<Ring>> {
    rings.iter().map(|indices| ring(indices, arcs)).collect()
}

/// Stitch arcs into one ring; consecutive arcs share their joint point.
/// A negative index `i` refers to arc `!i` traversed backwards.
fn ring(indices: &[i64], arcs: &[Vec<Position>]) -> DatasetResult<Ring> {
    let mut points: Ring = Vec::new();
    for &index in indices {
        let (slot, reversed) = if index < 0 {
            (!index, true)
        } else {
            (index, false)
        };
        let arc = usize::try_from(slot)
            .ok()
            .and_then(|slot| arcs.get(slot))
            .ok_or_else(|| DatasetError::Format(format!("arc index {index} out of range")))?;

        points.pop();
        if reversed {
            points.extend(arc.iter().rev().cloned());
        } else {
            points.extend(arc.iter().cloned());
        }
    }
    // Degenerate rings are padded so they still close.
    if let Some(first) = points.first().cloned() {
        while points.len() < 4 {
            points.push(first.clone());
        }
    }
    Ok(points)
}
