use std::collections::BTreeSet;
use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec2};

use crate::input::{EventResponse, InputEvent, MouseButton, PointerId, PointerKind, PointerSample};

/// Radians of rotation per dragged pixel.
pub const ROTATION_PER_PIXEL: f32 = 0.005;

/// Pitch stays this far away from the poles.
pub const PITCH_MARGIN: f32 = 0.2;
pub const MAX_PITCH_RAD: f32 = FRAC_PI_2 - PITCH_MARGIN;
pub const MIN_PITCH_RAD: f32 = -MAX_PITCH_RAD;

/// Globe orientation. Yaw is unbounded; pitch is kept inside
/// [`MIN_PITCH_RAD`, `MAX_PITCH_RAD`] by every mutator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    yaw: f32,
    pitch: f32,
}

impl Orientation {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        let mut orientation = Self { yaw, pitch: 0.0 };
        orientation.set_pitch(pitch);
        orientation
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn add_yaw(&mut self, delta: f32) {
        if delta.is_finite() {
            self.yaw += delta;
        }
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        if pitch.is_nan() {
            return;
        }
        self.pitch = pitch.clamp(MIN_PITCH_RAD, MAX_PITCH_RAD);
    }

    /// Globe-to-world rotation: pitch about X applied after yaw about Y.
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_x(self.pitch) * Quat::from_rotation_y(self.yaw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        owner: PointerId,
        last: Option<Vec2>,
    },
}

/// Drag-to-rotate state machine plus idle spin.
#[derive(Debug, Clone)]
pub struct OrbitController {
    orientation: Orientation,
    drag: DragState,
    touches: BTreeSet<PointerId>,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(Orientation::default())
    }
}

impl OrbitController {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            drag: DragState::Idle,
            touches: BTreeSet::new(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn drag_owner(&self) -> Option<PointerId> {
        match self.drag {
            DragState::Dragging { owner, .. } => Some(owner),
            DragState::Idle => None,
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> EventResponse {
        match event {
            InputEvent::PointerDown { pointer, button } => self.pointer_down(pointer, *button),
            InputEvent::PointerMove(pointer) => self.pointer_move(pointer),
            InputEvent::PointerUp(pointer) | InputEvent::PointerCancel(pointer) => {
                self.pointer_up(pointer)
            }
            InputEvent::FocusLost => {
                self.end_all();
                EventResponse::IGNORED
            }
            InputEvent::Wheel { .. } => EventResponse::IGNORED,
        }
    }

    /// Idle spin for one frame. Paused while dragging or when reduced
    /// motion is requested.
    pub fn advance(&mut self, dt_secs: f32, rotation_speed: f32, reduced_motion: bool) -> bool {
        if reduced_motion || self.is_dragging() || dt_secs <= 0.0 {
            return false;
        }
        self.orientation.add_yaw(dt_secs * rotation_speed);
        true
    }

    fn pointer_down(&mut self, pointer: &PointerSample, button: MouseButton) -> EventResponse {
        match pointer.kind {
            PointerKind::Mouse => {
                if button != MouseButton::Primary {
                    return EventResponse::IGNORED;
                }
                self.begin_drag(pointer);
                EventResponse {
                    consumed: true,
                    changed: false,
                }
            }
            PointerKind::Touch => {
                self.touches.insert(pointer.id);
                if self.touches.len() == 1 && !self.is_dragging() {
                    self.begin_drag(pointer);
                } else if self.touches.len() >= 2 && self.is_dragging() {
                    // A second finger hands control to pinch-zoom; no inertia.
                    tracing::trace!("second touch aborted drag");
                    self.drag = DragState::Idle;
                }
                EventResponse {
                    consumed: true,
                    changed: false,
                }
            }
        }
    }

    fn pointer_move(&mut self, pointer: &PointerSample) -> EventResponse {
        let DragState::Dragging { owner, last } = &mut self.drag else {
            return EventResponse::IGNORED;
        };
        if *owner != pointer.id {
            return EventResponse::IGNORED;
        }
        let Some(previous) = last.replace(pointer.position) else {
            return EventResponse {
                consumed: true,
                changed: false,
            };
        };

        let delta = pointer.position - previous;
        self.orientation.add_yaw(delta.x * ROTATION_PER_PIXEL);
        self.orientation
            .set_pitch(self.orientation.pitch() + delta.y * ROTATION_PER_PIXEL);
        EventResponse {
            consumed: true,
            changed: delta != Vec2::ZERO,
        }
    }

    fn pointer_up(&mut self, pointer: &PointerSample) -> EventResponse {
        if pointer.kind == PointerKind::Touch {
            self.touches.remove(&pointer.id);
        }
        if self.drag_owner() == Some(pointer.id) {
            self.drag = DragState::Idle;
            return EventResponse {
                consumed: true,
                changed: false,
            };
        }
        EventResponse::IGNORED
    }

    fn begin_drag(&mut self, pointer: &PointerSample) {
        self.drag = DragState::Dragging {
            owner: pointer.id,
            last: Some(pointer.position),
        };
    }

    fn end_all(&mut self) {
        self.drag = DragState::Idle;
        self.touches.clear();
    }
}
