use glam::{Mat4, Vec2, Vec3};

use crate::picking::Ray;

pub const FOV_MIN_DEG: f32 = 25.0;
pub const FOV_MAX_DEG: f32 = 75.0;
pub const DEFAULT_FOV_DEG: f32 = 55.0;

/// Distance from the globe centre to the eye.
pub const CAMERA_DISTANCE: f32 = 3.0;

/// Fixed perspective camera looking at the globe centre.
///
/// The globe rotates under the camera, so the only camera state that changes
/// at runtime is the field of view and the viewport size.
#[derive(Debug, Clone)]
pub struct GlobeCamera {
    position: Vec3,
    target: Vec3,
    fov_y_deg: f32,
    near: f32,
    far: f32,
    viewport_size: (u32, u32),
}

impl Default for GlobeCamera {
    fn default() -> Self {
        Self::new((1, 1))
    }
}

impl GlobeCamera {
    pub fn new(viewport_size: (u32, u32)) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, CAMERA_DISTANCE),
            target: Vec3::ZERO,
            fov_y_deg: DEFAULT_FOV_DEG,
            near: 0.1,
            far: 1000.0,
            viewport_size,
        }
    }

    pub fn fov_deg(&self) -> f32 {
        self.fov_y_deg
    }

    /// Set the vertical field of view, saturating at the zoom limits.
    pub fn set_fov_deg(&mut self, fov_deg: f32) {
        if fov_deg.is_nan() {
            return;
        }
        self.fov_y_deg = fov_deg.clamp(FOV_MIN_DEG, FOV_MAX_DEG);
    }

    /// Multiply the field of view by `factor`; the result is clamped.
    pub fn scale_fov(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.set_fov_deg(self.fov_y_deg * factor);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn update_viewport(&mut self, size: (u32, u32)) {
        self.viewport_size = (size.0.max(1), size.1.max(1));
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        self.viewport_size
    }

    pub fn aspect(&self) -> f32 {
        let (w, h) = self.viewport_size;
        if w == 0 || h == 0 {
            1.0
        } else {
            w as f32 / h as f32
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect().max(0.001),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Pixel position (origin top-left, y down) to normalized device
    /// coordinates (origin centre, y up).
    pub fn pixel_to_ndc(&self, pixel: Vec2) -> Vec2 {
        let (w, h) = self.viewport_size;
        let w = w.max(1) as f32;
        let h = h.max(1) as f32;
        Vec2::new(pixel.x / w * 2.0 - 1.0, -(pixel.y / h) * 2.0 + 1.0)
    }

    /// World-space ray from the eye through a point in NDC.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let on_near_plane = inverse.project_point3(ndc.extend(0.0));
        Ray::new(
            self.position,
            (on_near_plane - self.position).normalize_or_zero(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fov_is_clamped_on_every_write() {
        let mut camera = GlobeCamera::default();
        assert_eq!(camera.fov_deg(), DEFAULT_FOV_DEG);
        camera.set_fov_deg(10.0);
        assert_eq!(camera.fov_deg(), FOV_MIN_DEG);
        camera.scale_fov(100.0);
        assert_eq!(camera.fov_deg(), FOV_MAX_DEG);
        camera.scale_fov(f32::NAN);
        camera.scale_fov(-2.0);
        assert_eq!(camera.fov_deg(), FOV_MAX_DEG);
    }

    #[test]
    fn centre_ray_points_at_globe() {
        let camera = GlobeCamera::new((800, 600));
        let ndc = camera.pixel_to_ndc(Vec2::new(400.0, 300.0));
        assert!(ndc.length() < 1e-6);
        let ray = camera.ray_from_ndc(ndc);
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, CAMERA_DISTANCE));
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn top_left_pixel_maps_to_upper_left_ndc() {
        let camera = GlobeCamera::new((200, 100));
        let ndc = camera.pixel_to_ndc(Vec2::ZERO);
        assert_eq!(ndc, Vec2::new(-1.0, 1.0));
        let ray = camera.ray_from_ndc(ndc);
        assert!(ray.dir.x < 0.0 && ray.dir.y > 0.0 && ray.dir.z < 0.0);
        // Half the vertical FOV above the view axis.
        let half = (ray.dir.y / -ray.dir.z).atan().to_degrees();
        assert!((half - DEFAULT_FOV_DEG / 2.0).abs() < 1e-2);
    }
}
