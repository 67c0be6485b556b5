//! Country outlines projected onto the globe.

use country_data::{CountryCollection, CountryProperties, Ring};
use glam::Vec3;
use settings::Locale;

use crate::geo::{project, GeoCoordinate};

/// Outlines float just above the unit globe so they never z-fight with it.
pub const OUTLINE_RADIUS: f32 = 1.002;

/// Uniform scale applied to the highlighted outline.
pub const HIGHLIGHT_SCALE: f32 = 1.01;

/// Spacing of graticule meridians and parallels.
pub const GRATICULE_STEP_DEG: u32 = 15;

/// Sampling step along each graticule line.
const GRATICULE_SAMPLE_DEG: usize = 2;

/// Parallels stop short of the poles.
const GRATICULE_MAX_LAT: i32 = 80;

/// Handle to an outline inside one particular [`OutlineSet`].
///
/// Handles carry the generation of the set that issued them and stop
/// resolving once that set has been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutlineId {
    generation: u64,
    index: u32,
}

impl OutlineId {
    pub fn generation(self) -> u64 {
        self.generation
    }

    pub fn index(self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisualState {
    #[default]
    Normal,
    Highlighted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    fn from_segments(segments: &[[Vec3; 2]]) -> Self {
        let count = (segments.len() * 2).max(1) as f32;
        let center = segments
            .iter()
            .flat_map(|s| s.iter())
            .fold(Vec3::ZERO, |acc, p| acc + *p)
            / count;
        let radius = segments
            .iter()
            .flat_map(|s| s.iter())
            .map(|p| p.distance(center))
            .fold(0.0_f32, f32::max);
        Self { center, radius }
    }
}

#[derive(Debug, Clone)]
pub struct CountryOutline {
    id: OutlineId,
    name: String,
    iso_code: String,
    segments: Vec<[Vec3; 2]>,
    bounds: BoundingSphere,
    state: VisualState,
    scale: f32,
}

impl CountryOutline {
    pub fn id(&self) -> OutlineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn iso_code(&self) -> &str {
        &self.iso_code
    }

    /// Line segments in globe-local space, before emphasis scaling.
    pub fn segments(&self) -> &[[Vec3; 2]] {
        &self.segments
    }

    /// Flat vertex buffer (two vertices per segment) with emphasis applied.
    pub fn line_vertices(&self) -> Vec<[f32; 3]> {
        self.segments
            .iter()
            .flat_map(|s| s.iter())
            .map(|p| (*p * self.scale).to_array())
            .collect()
    }

    pub fn bounds(&self) -> BoundingSphere {
        self.bounds
    }

    pub fn state(&self) -> VisualState {
        self.state
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_highlighted(&self) -> bool {
        self.state == VisualState::Highlighted
    }

    pub(crate) fn set_highlighted(&mut self, highlighted: bool) {
        if highlighted {
            self.state = VisualState::Highlighted;
            self.scale = HIGHLIGHT_SCALE;
        } else {
            self.state = VisualState::Normal;
            self.scale = 1.0;
        }
    }
}

/// Complete set of outlines produced by one rebuild.
#[derive(Debug, Clone, Default)]
pub struct OutlineSet {
    generation: u64,
    locale: Locale,
    outlines: Vec<CountryOutline>,
}

impl OutlineSet {
    /// Empty set for the given generation.
    pub fn empty(generation: u64, locale: Locale) -> Self {
        Self {
            generation,
            locale,
            outlines: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn len(&self) -> usize {
        self.outlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outlines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryOutline> {
        self.outlines.iter()
    }

    pub fn get(&self, id: OutlineId) -> Option<&CountryOutline> {
        if id.generation != self.generation {
            return None;
        }
        self.outlines.get(id.index as usize)
    }

    pub fn get_mut(&mut self, id: OutlineId) -> Option<&mut CountryOutline> {
        if id.generation != self.generation {
            return None;
        }
        self.outlines.get_mut(id.index as usize)
    }

    pub fn segment_count(&self) -> usize {
        self.outlines.iter().map(|o| o.segments.len()).sum()
    }

    pub fn highlighted(&self) -> Option<&CountryOutline> {
        self.outlines.iter().find(|o| o.is_highlighted())
    }

    fn push(&mut self, name: String, iso_code: String, segments: Vec<[Vec3; 2]>) {
        let id = OutlineId {
            generation: self.generation,
            index: self.outlines.len() as u32,
        };
        let bounds = BoundingSphere::from_segments(&segments);
        self.outlines.push(CountryOutline {
            id,
            name,
            iso_code,
            segments,
            bounds,
            state: VisualState::Normal,
            scale: 1.0,
        });
    }
}

/// Turns a country collection into an [`OutlineSet`].
#[derive(Debug, Clone, Copy)]
pub struct OutlineBuilder {
    locale: Locale,
    radius: f32,
}

impl OutlineBuilder {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            radius: OUTLINE_RADIUS,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// One outline per polygon outer ring; holes are ignored and features
    /// without a usable outer ring contribute nothing.
    pub fn build(&self, collection: &CountryCollection, generation: u64) -> OutlineSet {
        let mut set = OutlineSet::empty(generation, self.locale);
        for feature in &collection.features {
            let Some(geometry) = feature.geometry.as_ref() else {
                continue;
            };
            let name = localized_name(&feature.properties, self.locale);
            let iso = iso_code(&feature.properties);
            for rings in geometry.polygons() {
                let Some(outer) = rings.first() else {
                    continue;
                };
                let segments = self.ring_segments(outer);
                if segments.is_empty() {
                    continue;
                }
                set.push(name.clone(), iso.clone(), segments);
            }
        }
        tracing::debug!(
            generation,
            locale = self.locale.code(),
            features = collection.len(),
            outlines = set.len(),
            "built country outlines"
        );
        set
    }

    /// Segments between consecutive vertices. A vertex that cannot be read
    /// breaks the ring: both segments touching it are dropped.
    fn ring_segments(&self, ring: &Ring) -> Vec<[Vec3; 2]> {
        let points: Vec<Option<Vec3>> = ring
            .iter()
            .map(|p| GeoCoordinate::from_position(p).map(|c| c.to_sphere(self.radius)))
            .collect();
        points
            .windows(2)
            .filter_map(|pair| match pair {
                [Some(a), Some(b)] => Some([*a, *b]),
                _ => None,
            })
            .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Display name in the requested locale, falling back through the generic
/// name fields and finally the other language.
pub fn localized_name(props: &CountryProperties, locale: Locale) -> String {
    let chain = match locale {
        Locale::Russian => [&props.name_ru, &props.name, &props.name_upper, &props.name_en],
        Locale::English => [&props.name_en, &props.name, &props.name_upper, &props.name_ru],
    };
    chain
        .into_iter()
        .find_map(non_empty)
        .unwrap_or_default()
        .to_owned()
}

pub fn iso_code(props: &CountryProperties) -> String {
    [&props.iso_a3, &props.a3, &props.iso_n3]
        .into_iter()
        .find_map(non_empty)
        .unwrap_or_default()
        .to_owned()
}

/// Meridian and parallel grid on the unit sphere as line segments.
///
/// Meridians run pole to pole every `step_deg` of longitude, parallels every
/// `step_deg` of latitude within ±80°. The grid is decoration only and never
/// enters an [`OutlineSet`], so it cannot be hovered.
pub fn graticule_segments(step_deg: u32) -> Vec<[Vec3; 2]> {
    let step = step_deg as usize;
    if step == 0 {
        return Vec::new();
    }
    let mut segments = Vec::new();
    for lon in (-180..=180).step_by(step) {
        let lon = f64::from(lon);
        for lat in (-90..90).step_by(GRATICULE_SAMPLE_DEG) {
            let lat = f64::from(lat);
            segments.push([
                project(lat, lon, 1.0),
                project(lat + GRATICULE_SAMPLE_DEG as f64, lon, 1.0),
            ]);
        }
    }
    for lat in (-GRATICULE_MAX_LAT..=GRATICULE_MAX_LAT).step_by(step) {
        let lat = f64::from(lat);
        for lon in (-180..180).step_by(GRATICULE_SAMPLE_DEG) {
            let lon = f64::from(lon);
            segments.push([
                project(lat, lon, 1.0),
                project(lat, lon + GRATICULE_SAMPLE_DEG as f64, 1.0),
            ]);
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use country_data::{CountryFeature, Geometry};

    fn square(lon: f64, lat: f64) -> Ring {
        vec![
            vec![lon, lat],
            vec![lon + 1.0, lat],
            vec![lon + 1.0, lat + 1.0],
            vec![lon, lat + 1.0],
            vec![lon, lat],
        ]
    }

    fn feature(props: CountryProperties, geometry: Option<Geometry>) -> CountryFeature {
        CountryFeature {
            properties: props,
            geometry,
        }
    }

    fn named(en: &str, ru: &str, iso: &str) -> CountryProperties {
        CountryProperties {
            name_en: Some(en.into()),
            name_ru: Some(ru.into()),
            iso_a3: Some(iso.into()),
            ..Default::default()
        }
    }

    #[test]
    fn outer_rings_only_one_outline_per_polygon() {
        let hole = vec![
            vec![0.2, 0.2],
            vec![0.4, 0.2],
            vec![0.4, 0.4],
            vec![0.2, 0.2],
        ];
        let collection = CountryCollection {
            features: vec![
                feature(
                    named("Alpha", "Альфа", "ALP"),
                    Some(Geometry::Polygon {
                        coordinates: vec![square(0.0, 0.0), hole],
                    }),
                ),
                feature(
                    named("Beta", "Бета", "BET"),
                    Some(Geometry::MultiPolygon {
                        coordinates: vec![vec![square(10.0, 0.0)], vec![square(20.0, 0.0)]],
                    }),
                ),
            ],
        };

        let set = OutlineBuilder::new(Locale::English).build(&collection, 7);
        assert_eq!(set.len(), 3);
        assert_eq!(set.generation(), 7);
        let outlines: Vec<_> = set.iter().collect();
        assert_eq!(outlines[0].segments().len(), 4);
        assert_eq!(outlines[1].name(), "Beta");
        assert_eq!(outlines[2].iso_code(), "BET");
        assert_eq!(outlines[0].line_vertices().len(), 8);

        for outline in set.iter() {
            assert_eq!(outline.state(), VisualState::Normal);
            for p in outline.segments().iter().flat_map(|s| s.iter()) {
                assert!((p.length() - OUTLINE_RADIUS).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn malformed_features_are_skipped() {
        let collection = CountryCollection {
            features: vec![
                feature(named("NoGeom", "", "NOG"), None),
                feature(
                    named("Empty", "", "EMP"),
                    Some(Geometry::Polygon {
                        coordinates: vec![],
                    }),
                ),
                feature(
                    named("EmptyRing", "", "EMR"),
                    Some(Geometry::Polygon {
                        coordinates: vec![vec![]],
                    }),
                ),
                feature(named("Point", "", "PNT"), Some(Geometry::Unsupported)),
                feature(
                    named("Valid", "", "VAL"),
                    Some(Geometry::Polygon {
                        coordinates: vec![square(0.0, 0.0)],
                    }),
                ),
            ],
        };
        let set = OutlineBuilder::new(Locale::English).build(&collection, 1);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().iso_code(), "VAL");
    }

    #[test]
    fn invalid_vertices_break_the_ring() {
        let ring = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![f64::NAN, 1.0],
            vec![0.0, 1.0],
            vec![0.0],
            vec![0.0, 0.0],
        ];
        let collection = CountryCollection {
            features: vec![feature(
                named("Broken", "", "BRK"),
                Some(Geometry::Polygon {
                    coordinates: vec![ring],
                }),
            )],
        };
        let set = OutlineBuilder::new(Locale::English).build(&collection, 1);
        let outline = set.iter().next().unwrap();
        assert_eq!(outline.segments().len(), 1);
        assert!(outline
            .segments()
            .iter()
            .flat_map(|s| s.iter())
            .all(|p| p.is_finite()));

        let all_bad = CountryCollection {
            features: vec![feature(
                named("Bad", "", "BAD"),
                Some(Geometry::Polygon {
                    coordinates: vec![vec![vec![f64::NAN, 0.0], vec![1.0, f64::NAN]]],
                }),
            )],
        };
        assert!(OutlineBuilder::new(Locale::English)
            .build(&all_bad, 1)
            .is_empty());
    }

    #[test]
    fn name_fallback_follows_locale() {
        let full = CountryProperties {
            name: Some("Generic".into()),
            name_upper: Some("UPPER".into()),
            name_en: Some("English".into()),
            name_ru: Some("Русский".into()),
            ..Default::default()
        };
        assert_eq!(localized_name(&full, Locale::English), "English");
        assert_eq!(localized_name(&full, Locale::Russian), "Русский");

        let generic = CountryProperties {
            name: Some("Generic".into()),
            name_upper: Some("UPPER".into()),
            name_en: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(localized_name(&generic, Locale::English), "Generic");
        assert_eq!(localized_name(&generic, Locale::Russian), "Generic");

        let upper = CountryProperties {
            name_upper: Some("UPPER".into()),
            ..Default::default()
        };
        assert_eq!(localized_name(&upper, Locale::Russian), "UPPER");

        let only_en = CountryProperties {
            name_en: Some("English".into()),
            ..Default::default()
        };
        assert_eq!(localized_name(&only_en, Locale::Russian), "English");
        assert_eq!(localized_name(&CountryProperties::default(), Locale::English), "");
    }

    #[test]
    fn iso_code_fallback_chain() {
        let mut props = CountryProperties {
            iso_a3: Some("FRA".into()),
            a3: Some("FRX".into()),
            iso_n3: Some("250".into()),
            ..Default::default()
        };
        assert_eq!(iso_code(&props), "FRA");
        props.iso_a3 = Some(String::new());
        assert_eq!(iso_code(&props), "FRX");
        props.a3 = None;
        assert_eq!(iso_code(&props), "250");
        props.iso_n3 = None;
        assert_eq!(iso_code(&props), "");
    }

    #[test]
    fn handles_do_not_cross_generations() {
        let collection = CountryCollection {
            features: vec![feature(
                named("Alpha", "", "ALP"),
                Some(Geometry::Polygon {
                    coordinates: vec![square(0.0, 0.0)],
                }),
            )],
        };
        let builder = OutlineBuilder::new(Locale::English);
        let old = builder.build(&collection, 1);
        let new = builder.build(&collection, 2);
        let old_id = old.iter().next().unwrap().id();
        assert!(old.get(old_id).is_some());
        assert!(new.get(old_id).is_none());
    }

    #[test]
    fn graticule_covers_the_sphere() {
        let segments = graticule_segments(GRATICULE_STEP_DEG);
        // 25 meridians of 90 samples, 11 parallels of 180 samples.
        assert_eq!(segments.len(), 25 * 90 + 11 * 180);
        for point in segments.iter().flatten() {
            assert!((point.length() - 1.0).abs() < 1e-5);
        }
        let top = segments.iter().flatten().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((top - 1.0).abs() < 1e-5);
        assert!(graticule_segments(0).is_empty());
    }
}
