use std::collections::BTreeMap;

use glam::Vec2;

use crate::camera::GlobeCamera;
use crate::input::{EventResponse, InputEvent, PointerId, PointerKind, PointerSample};

/// Wheel step in log-FOV units before sensitivity scaling.
pub const WHEEL_STEP: f32 = 0.1;

/// Two-finger pinch tracker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinchState {
    touches: BTreeMap<PointerId, Vec2>,
    last_distance: Option<f32>,
}

impl PinchState {
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    pub fn last_distance(&self) -> Option<f32> {
        self.last_distance
    }

    fn distance(&self) -> Option<f32> {
        if self.touches.len() != 2 {
            return None;
        }
        let mut points = self.touches.values();
        let a = points.next()?;
        let b = points.next()?;
        Some(a.distance(*b))
    }

    fn clear(&mut self) {
        self.touches.clear();
        self.last_distance = None;
    }
}

/// Wheel and pinch zoom. Both change the camera field of view, which the
/// camera clamps on every write.
#[derive(Debug, Clone, Default)]
pub struct ZoomController {
    pinch: PinchState,
}

impl ZoomController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pinch(&self) -> &PinchState {
        &self.pinch
    }

    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        camera: &mut GlobeCamera,
        sensitivity: f32,
    ) -> EventResponse {
        match event {
            InputEvent::Wheel { delta_y } => {
                let before = camera.fov_deg();
                apply_wheel(camera, *delta_y, sensitivity);
                EventResponse {
                    consumed: true,
                    changed: camera.fov_deg() != before,
                }
            }
            InputEvent::PointerDown { pointer, .. } => self.touch_down(pointer),
            InputEvent::PointerMove(pointer) => self.touch_move(pointer, camera, sensitivity),
            InputEvent::PointerUp(pointer) | InputEvent::PointerCancel(pointer) => {
                self.touch_up(pointer)
            }
            InputEvent::FocusLost => {
                self.pinch.clear();
                EventResponse::IGNORED
            }
        }
    }

    fn touch_down(&mut self, pointer: &PointerSample) -> EventResponse {
        if pointer.kind != PointerKind::Touch {
            return EventResponse::IGNORED;
        }
        self.pinch.touches.insert(pointer.id, pointer.position);
        self.pinch.last_distance = self.pinch.distance();
        EventResponse {
            consumed: true,
            changed: false,
        }
    }

    fn touch_move(
        &mut self,
        pointer: &PointerSample,
        camera: &mut GlobeCamera,
        sensitivity: f32,
    ) -> EventResponse {
        if pointer.kind != PointerKind::Touch {
            return EventResponse::IGNORED;
        }
        let Some(slot) = self.pinch.touches.get_mut(&pointer.id) else {
            return EventResponse::IGNORED;
        };
        *slot = pointer.position;

        let Some(current) = self.pinch.distance() else {
            return EventResponse {
                consumed: true,
                changed: false,
            };
        };
        if current <= 0.0 {
            return EventResponse {
                consumed: true,
                changed: false,
            };
        }

        let before = camera.fov_deg();
        if let Some(previous) = self.pinch.last_distance.filter(|d| *d > 0.0) {
            // Fingers moving apart give a factor below one: zoom in.
            camera.scale_fov((previous / current).powf(sensitivity));
        }
        self.pinch.last_distance = Some(current);
        EventResponse {
            consumed: true,
            changed: camera.fov_deg() != before,
        }
    }

    fn touch_up(&mut self, pointer: &PointerSample) -> EventResponse {
        if self.pinch.touches.remove(&pointer.id).is_none() {
            return EventResponse::IGNORED;
        }
        if self.pinch.touches.len() != 2 {
            self.pinch.last_distance = None;
        }
        EventResponse {
            consumed: true,
            changed: false,
        }
    }
}

/// One wheel notch: only the sign of the delta matters.
pub fn apply_wheel(camera: &mut GlobeCamera, delta_y: f32, sensitivity: f32) {
    let sign = if delta_y > 0.0 {
        1.0
    } else if delta_y < 0.0 {
        -1.0
    } else {
        0.0
    };
    camera.scale_fov((sign * WHEEL_STEP * sensitivity).exp());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{DEFAULT_FOV_DEG, FOV_MAX_DEG, FOV_MIN_DEG};
    use crate::input::MouseButton;

    fn down(id: u64, x: f32, y: f32) -> InputEvent {
        InputEvent::PointerDown {
            pointer: PointerSample::touch(id, Vec2::new(x, y)),
            button: MouseButton::Primary,
        }
    }

    fn moved(id: u64, x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMove(PointerSample::touch(id, Vec2::new(x, y)))
    }

    fn up(id: u64) -> InputEvent {
        InputEvent::PointerUp(PointerSample::touch(id, Vec2::ZERO))
    }

    #[test]
    fn wheel_sequence_matches_closed_form() {
        let mut camera = GlobeCamera::default();
        let mut zoom = ZoomController::new();
        let sensitivity = 1.3;
        let deltas = [120.0, -3.0, 53.0, 0.0, 1.0, -0.5, 7.0];
        for delta_y in deltas {
            let response = zoom.handle_event(&InputEvent::Wheel { delta_y }, &mut camera, sensitivity);
            assert!(response.consumed);
        }
        let signs = [1.0_f32, -1.0, 1.0, 0.0, 1.0, -1.0, 1.0];
        let sum: f32 = signs.iter().sum();
        let expected = (DEFAULT_FOV_DEG * (sum * WHEEL_STEP * sensitivity).exp())
            .clamp(FOV_MIN_DEG, FOV_MAX_DEG);
        assert!((camera.fov_deg() - expected).abs() < 1e-3);
    }

    #[test]
    fn wheel_saturates_at_limits() {
        let mut camera = GlobeCamera::default();
        for _ in 0..100 {
            apply_wheel(&mut camera, 1.0, 2.5);
            assert!(camera.fov_deg() <= FOV_MAX_DEG);
        }
        assert_eq!(camera.fov_deg(), FOV_MAX_DEG);
        for _ in 0..100 {
            apply_wheel(&mut camera, -1.0, 2.5);
            assert!(camera.fov_deg() >= FOV_MIN_DEG);
        }
        assert_eq!(camera.fov_deg(), FOV_MIN_DEG);
    }

    #[test]
    fn spreading_fingers_zooms_in() {
        let mut camera = GlobeCamera::default();
        let mut zoom = ZoomController::new();
        zoom.handle_event(&down(1, 100.0, 100.0), &mut camera, 1.0);
        zoom.handle_event(&down(2, 200.0, 100.0), &mut camera, 1.0);
        assert_eq!(zoom.pinch().last_distance(), Some(100.0));

        zoom.handle_event(&moved(2, 225.0, 100.0), &mut camera, 1.0);
        let expected = DEFAULT_FOV_DEG * (100.0 / 125.0);
        assert!((camera.fov_deg() - expected).abs() < 1e-4);
        assert_eq!(zoom.pinch().last_distance(), Some(125.0));
    }

    #[test]
    fn sensitivity_is_an_exponent() {
        let mut camera = GlobeCamera::default();
        let mut zoom = ZoomController::new();
        zoom.handle_event(&down(1, 0.0, 0.0), &mut camera, 2.0);
        zoom.handle_event(&down(2, 100.0, 0.0), &mut camera, 2.0);
        zoom.handle_event(&moved(2, 90.0, 0.0), &mut camera, 2.0);
        let expected = (DEFAULT_FOV_DEG * (100.0_f32 / 90.0).powf(2.0)).min(FOV_MAX_DEG);
        assert!((camera.fov_deg() - expected).abs() < 1e-3);
    }

    #[test]
    fn lifting_a_finger_resets_pinch() {
        let mut camera = GlobeCamera::default();
        let mut zoom = ZoomController::new();
        zoom.handle_event(&down(1, 0.0, 0.0), &mut camera, 1.0);
        zoom.handle_event(&down(2, 100.0, 0.0), &mut camera, 1.0);
        zoom.handle_event(&up(2), &mut camera, 1.0);
        assert_eq!(zoom.pinch().last_distance(), None);
        assert_eq!(zoom.pinch().touch_count(), 1);

        // Single finger moving never zooms.
        zoom.handle_event(&moved(1, 500.0, 0.0), &mut camera, 1.0);
        assert_eq!(camera.fov_deg(), DEFAULT_FOV_DEG);

        // A new second finger starts a fresh pinch from its own distance.
        zoom.handle_event(&down(3, 600.0, 0.0), &mut camera, 1.0);
        assert_eq!(zoom.pinch().last_distance(), Some(100.0));
        assert_eq!(camera.fov_deg(), DEFAULT_FOV_DEG);
    }

    #[test]
    fn focus_loss_clears_pinch() {
        let mut camera = GlobeCamera::default();
        let mut zoom = ZoomController::new();
        zoom.handle_event(&down(1, 0.0, 0.0), &mut camera, 1.0);
        zoom.handle_event(&down(2, 100.0, 0.0), &mut camera, 1.0);
        assert_eq!(zoom.pinch().last_distance(), Some(100.0));

        let response = zoom.handle_event(&InputEvent::FocusLost, &mut camera, 1.0);
        assert!(!response.changed);
        assert_eq!(zoom.pinch().touch_count(), 0);
        assert_eq!(zoom.pinch().last_distance(), None);

        // Moves from fingers forgotten on focus loss do not zoom.
        zoom.handle_event(&moved(2, 300.0, 0.0), &mut camera, 1.0);
        assert_eq!(camera.fov_deg(), DEFAULT_FOV_DEG);
    }

    #[test]
    fn third_finger_suspends_pinch() {
        let mut camera = GlobeCamera::default();
        let mut zoom = ZoomController::new();
        zoom.handle_event(&down(1, 0.0, 0.0), &mut camera, 1.0);
        zoom.handle_event(&down(2, 100.0, 0.0), &mut camera, 1.0);
        zoom.handle_event(&down(3, 50.0, 50.0), &mut camera, 1.0);
        zoom.handle_event(&moved(2, 300.0, 0.0), &mut camera, 1.0);
        assert_eq!(camera.fov_deg(), DEFAULT_FOV_DEG);

        zoom.handle_event(&up(3), &mut camera, 1.0);
        // First move after returning to two fingers only seeds the distance.
        zoom.handle_event(&moved(2, 200.0, 0.0), &mut camera, 1.0);
        assert_eq!(camera.fov_deg(), DEFAULT_FOV_DEG);
        assert_eq!(zoom.pinch().last_distance(), Some(200.0));
    }

    #[test]
    fn untracked_and_mouse_pointers_are_ignored() {
        let mut camera = GlobeCamera::default();
        let mut zoom = ZoomController::new();
        assert_eq!(
            zoom.handle_event(&moved(7, 1.0, 1.0), &mut camera, 1.0),
            EventResponse::IGNORED
        );
        assert_eq!(zoom.handle_event(&up(7), &mut camera, 1.0), EventResponse::IGNORED);
        let mouse = InputEvent::PointerDown {
            pointer: PointerSample::mouse(Vec2::ZERO),
            button: MouseButton::Primary,
        };
        assert_eq!(zoom.handle_event(&mouse, &mut camera, 1.0), EventResponse::IGNORED);
        assert_eq!(zoom.pinch().touch_count(), 0);
    }
}
