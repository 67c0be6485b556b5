//! Hover picking against country outlines.

use glam::{Quat, Vec3};

use crate::camera::GlobeCamera;
use crate::outline::{OutlineId, OutlineSet};
use crate::state::{HoveredCountry, StateSink};

/// How close (world units) the ray must pass to a line to count as a hit.
pub const LINE_THRESHOLD: f32 = 0.03;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

/// Closest approach between a ray and a segment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SegmentProximity {
    /// Distance along the ray (the direction is unit length).
    pub ray_t: f32,
    pub point_on_segment: Vec3,
    pub distance_sq: f32,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    pub fn transformed(&self, rotation: Quat) -> Self {
        Self::new(rotation * self.origin, rotation * self.dir)
    }

    pub fn distance_sq_to_point(&self, point: Vec3) -> f32 {
        let t = (point - self.origin).dot(self.dir).max(0.0);
        self.at(t).distance_squared(point)
    }

    /// Closest points between this ray (`t >= 0`) and segment `a..b`.
    ///
    /// Requires a unit-length direction.
    pub fn closest_to_segment(&self, a: Vec3, b: Vec3) -> SegmentProximity {
        let seg = b - a;
        let r = self.origin - a;
        let seg_len_sq = seg.length_squared();
        let c = self.dir.dot(r);

        let (t, u) = if seg_len_sq <= f32::EPSILON {
            ((-c).max(0.0), 0.0)
        } else {
            let f = seg.dot(r);
            let along = self.dir.dot(seg);
            let denom = seg_len_sq - along * along;
            let t = if denom > f32::EPSILON {
                ((along * f - c * seg_len_sq) / denom).max(0.0)
            } else {
                0.0
            };
            let u = (along * t + f) / seg_len_sq;
            if u < 0.0 {
                ((-c).max(0.0), 0.0)
            } else if u > 1.0 {
                ((along - c).max(0.0), 1.0)
            } else {
                (t, u)
            }
        };

        let point_on_segment = a + seg * u;
        SegmentProximity {
            ray_t: t,
            point_on_segment,
            distance_sq: self.at(t).distance_squared(point_on_segment),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LineHit {
    pub outline: OutlineId,
    /// Distance from the ray origin.
    pub distance: f32,
    /// Hit point on the outline, in world space.
    pub point: Vec3,
}

/// Every segment the world-space `ray` passes within `threshold` of,
/// nearest first; ties keep outline order.
///
/// `rotation` is the globe orientation. Outlines are tested in globe-local
/// space with their emphasis scale applied.
pub fn intersect_outlines(
    ray: &Ray,
    rotation: Quat,
    outlines: &OutlineSet,
    threshold: f32,
    range: (f32, f32),
) -> Vec<LineHit> {
    let local = ray.transformed(rotation.inverse());
    let threshold_sq = threshold * threshold;
    let mut hits = Vec::new();

    for outline in outlines.iter() {
        let scale = outline.scale();
        let bounds = outline.bounds();
        let reach = bounds.radius * scale + threshold;
        if local.distance_sq_to_point(bounds.center * scale) > reach * reach {
            continue;
        }

        for [a, b] in outline.segments() {
            let proximity = local.closest_to_segment(*a * scale, *b * scale);
            if proximity.distance_sq > threshold_sq {
                continue;
            }
            if proximity.ray_t < range.0 || proximity.ray_t > range.1 {
                continue;
            }
            hits.push(LineHit {
                outline: outline.id(),
                distance: proximity.ray_t,
                point: rotation * proximity.point_on_segment,
            });
        }
    }

    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.outline.index().cmp(&b.outline.index()))
    });
    hits
}

/// Nearest hit on the camera-facing side of the globe.
///
/// This is a hemisphere heuristic, not an occlusion test: a hit counts when
/// its world position points the same way as the camera position.
pub fn pick_front(
    ray: &Ray,
    rotation: Quat,
    outlines: &OutlineSet,
    camera: &GlobeCamera,
    threshold: f32,
) -> Option<LineHit> {
    let camera_pos = camera.position();
    intersect_outlines(
        ray,
        rotation,
        outlines,
        threshold,
        (camera.near(), camera.far()),
    )
    .into_iter()
    .find(|hit| hit.point.dot(camera_pos) > 0.0)
}

/// Keeps at most one outline highlighted and publishes what is under the
/// pointer every frame.
#[derive(Debug, Clone)]
pub struct HoverPicker {
    highlighted: Option<OutlineId>,
    threshold: f32,
}

impl Default for HoverPicker {
    fn default() -> Self {
        Self::new(LINE_THRESHOLD)
    }
}

impl HoverPicker {
    pub fn new(threshold: f32) -> Self {
        Self {
            highlighted: None,
            threshold,
        }
    }

    pub fn highlighted(&self) -> Option<OutlineId> {
        self.highlighted
    }

    /// Re-evaluate the hover target. `ray` is `None` when the pointer is
    /// outside the viewport.
    pub fn update<S: StateSink + ?Sized>(
        &mut self,
        ray: Option<&Ray>,
        rotation: Quat,
        camera: &GlobeCamera,
        outlines: &mut OutlineSet,
        sink: &mut S,
    ) -> Option<HoveredCountry> {
        let hit = ray.and_then(|ray| pick_front(ray, rotation, outlines, camera, self.threshold));
        let hovered = hit.and_then(|hit| {
            let outline = outlines.get(hit.outline)?;
            Some((
                hit.outline,
                HoveredCountry {
                    iso_code: outline.iso_code().to_owned(),
                    name: outline.name().to_owned(),
                },
            ))
        });

        match hovered {
            Some((id, country)) => {
                if self.highlighted != Some(id) {
                    self.clear_highlight(outlines);
                }
                if let Some(outline) = outlines.get_mut(id) {
                    outline.set_highlighted(true);
                }
                self.highlighted = Some(id);
                sink.set_hovered_country(Some(country.clone()));
                Some(country)
            }
            None => {
                self.clear_highlight(outlines);
                sink.set_hovered_country(None);
                None
            }
        }
    }

    /// Restore the current highlight, if it still resolves, to normal.
    pub fn clear_highlight(&mut self, outlines: &mut OutlineSet) {
        if let Some(previous) = self.highlighted.take() {
            if let Some(outline) = outlines.get_mut(previous) {
                outline.set_highlighted(false);
            }
        }
    }
}
