use glam::{Quat, Vec2};
use settings::NavigationSettings;

use crate::camera::GlobeCamera;
use crate::input::{EventResponse, EventTopic, InputEvent, InputHub, Subscription};
use crate::orbit::{Orientation, OrbitController};
use crate::picking::Ray;
use crate::zoom::ZoomController;

/// Camera plus the two controllers that drive it.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    camera: GlobeCamera,
    orbit: OrbitController,
    zoom: ZoomController,
}

/// Input subscriptions held while a navigator is attached to a window.
#[derive(Debug)]
pub struct NavigatorBindings {
    _orbit: Subscription,
    _zoom: Subscription,
}

impl Navigator {
    pub fn new(viewport_size: (u32, u32)) -> Self {
        Self {
            camera: GlobeCamera::new(viewport_size),
            ..Default::default()
        }
    }

    pub fn camera(&self) -> &GlobeCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut GlobeCamera {
        &mut self.camera
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    pub fn orientation(&self) -> Orientation {
        self.orbit.orientation()
    }

    pub fn rotation(&self) -> Quat {
        self.orbit.orientation().rotation()
    }

    pub fn resize(&mut self, size: (u32, u32)) {
        self.camera.update_viewport(size);
    }

    /// Subscribe both controllers to the topics they listen on.
    pub fn attach(&self, hub: &InputHub) -> NavigatorBindings {
        NavigatorBindings {
            _orbit: hub.subscribe(
                "orbit",
                &[EventTopic::Pointer, EventTopic::Touch, EventTopic::Focus],
            ),
            _zoom: hub.subscribe(
                "zoom",
                &[EventTopic::Wheel, EventTopic::Touch, EventTopic::Focus],
            ),
        }
    }

    /// Both controllers see every event; a touch can be part of a drag and
    /// a pinch in the same gesture.
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        settings: &NavigationSettings,
    ) -> EventResponse {
        let orbit = self.orbit.handle_event(event);
        let zoom = self
            .zoom
            .handle_event(event, &mut self.camera, settings.zoom_sensitivity());
        orbit.merge(zoom)
    }

    /// Per-frame idle rotation. Returns whether the orientation changed.
    pub fn advance(&mut self, dt_secs: f32, settings: &NavigationSettings) -> bool {
        self.orbit
            .advance(dt_secs, settings.rotation_speed(), settings.reduced_motion())
    }

    /// World-space ray under a pixel, or `None` outside the viewport.
    pub fn pointer_ray(&self, pixel: Vec2) -> Option<Ray> {
        let (w, h) = self.camera.viewport_size();
        if !pixel.is_finite()
            || pixel.x < 0.0
            || pixel.y < 0.0
            || pixel.x > w as f32
            || pixel.y > h as f32
        {
            return None;
        }
        Some(self.camera.ray_from_ndc(self.camera.pixel_to_ndc(pixel)))
    }
}
