//! Country polygon datasets.
//!
//! Parses GeoJSON and TopoJSON documents into a [`CountryCollection`] and
//! provides a loader that walks a list of sources until one succeeds.

pub mod loader;
mod topojson;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

pub use loader::{DatasetSource, FallbackLoader, FileSource};

/// Convenience alias for fallible dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// A GeoJSON position: longitude, latitude, then optional extra ordinates.
pub type Position = Vec<f64>;

/// A closed linear ring of positions.
pub type Ring = Vec<Position>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid dataset json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported dataset: {0}")]
    Format(String),
}

/// Parsed set of country features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryCollection {
    #[serde(default)]
    pub features: Vec<CountryFeature>,
}

impl CountryCollection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Parse a GeoJSON `FeatureCollection`, a single GeoJSON `Feature`, or a
    /// TopoJSON `Topology` (first object only).
    pub fn from_json_str(text: &str) -> DatasetResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> DatasetResult<Self> {
        let kind = value.get("type").and_then(Value::as_str).map(str::to_owned);
        match kind.as_deref() {
            Some("FeatureCollection") => {
                let features = match value.get("features") {
                    Some(Value::Array(items)) => {
                        items.iter().map(CountryFeature::from_value).collect()
                    }
                    _ => Vec::new(),
                };
                Ok(Self { features })
            }
            Some("Feature") => Ok(Self {
                features: vec![CountryFeature::from_value(&value)],
            }),
            Some("Topology") => topojson::decode(value),
            Some(other) => Err(DatasetError::Format(format!(
                "unexpected document type `{other}`"
            ))),
            None => Err(DatasetError::Format("missing document type".into())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryFeature {
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: CountryProperties,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl CountryFeature {
    /// Decode one feature on its own. A feature whose geometry cannot be read
    /// keeps its properties and loses the geometry, so it yields no outline
    /// without taking its siblings down with it.
    pub fn from_value(value: &Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(feature) => feature,
            Err(err) => {
                debug!("dropping unreadable feature geometry: {err}");
                let properties = value
                    .get("properties")
                    .and_then(|props| serde_json::from_value(props.clone()).ok())
                    .unwrap_or_default();
                Self {
                    properties,
                    geometry: None,
                }
            }
        }
    }
}

/// Name and code candidates carried by a feature.
///
/// Datasets disagree on field names, so every known variant is kept and the
/// outline builder walks them in priority order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryProperties {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "NAME", default, deserialize_with = "lenient_string")]
    pub name_upper: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name_en: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name_ru: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub iso_a3: Option<String>,
    #[serde(rename = "A3", default, deserialize_with = "lenient_string")]
    pub a3: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub iso_n3: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        #[serde(default, deserialize_with = "lenient_rings")]
        coordinates: Vec<Ring>,
    },
    MultiPolygon {
        #[serde(default, deserialize_with = "lenient_polygons")]
        coordinates: Vec<Vec<Ring>>,
    },
    /// Points, lines and collections carry no country outline.
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Each polygon as its list of rings, outer ring first.
    pub fn polygons(&self) -> Vec<&[Ring]> {
        match self {
            Geometry::Polygon { coordinates } => vec![coordinates.as_slice()],
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().map(Vec::as_slice).collect()
            }
            Geometry::Unsupported => Vec::new(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept strings and numbers (some datasets store `iso_n3` as a number).
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Rings with unreadable ordinates mapped to NaN; the outline builder skips
/// non-finite vertices.
pub(crate) fn lenient_rings<'de, D>(deserializer: D) -> Result<Vec<Ring>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .map(rings_from_value)
        .unwrap_or_default())
}

fn lenient_polygons<'de, D>(deserializer: D) -> Result<Vec<Vec<Ring>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .map(|value| elements(value).iter().map(rings_from_value).collect())
        .unwrap_or_default())
}

fn rings_from_value(value: &Value) -> Vec<Ring> {
    elements(value).iter().map(ring_from_value).collect()
}

fn ring_from_value(value: &Value) -> Ring {
    elements(value).iter().map(position_from_value).collect()
}

fn position_from_value(value: &Value) -> Position {
    elements(value)
        .iter()
        .map(|ordinate| ordinate.as_f64().unwrap_or(f64::NAN))
        .collect()
}

fn elements(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}
