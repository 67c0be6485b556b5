use glam::Vec2;
use globe_core::{InputEvent, MouseButton as GlobeButton, PointerSample};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent};

/// Pixels per wheel line when the platform reports pixel deltas.
const PIXELS_PER_LINE: f64 = 120.0;

/// Translates winit window events into globe input events.
///
/// winit reports button presses without a position, so the last cursor
/// position is remembered here.
#[derive(Debug, Default)]
pub struct WindowInput {
    cursor: Vec2,
}

impl WindowInput {
    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(InputEvent::PointerMove(PointerSample::mouse(self.cursor)))
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pointer = PointerSample::mouse(self.cursor);
                Some(match state {
                    ElementState::Pressed => InputEvent::PointerDown {
                        pointer,
                        button: map_button(*button),
                    },
                    ElementState::Released => InputEvent::PointerUp(pointer),
                })
            }
            WindowEvent::MouseWheel { delta, .. } => wheel_delta(delta)
                .filter(|d| *d != 0.0)
                .map(|delta_y| InputEvent::Wheel { delta_y }),
            WindowEvent::Touch(touch) => Some(touch_event(touch)),
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            _ => None,
        }
    }
}

fn map_button(button: MouseButton) -> GlobeButton {
    match button {
        MouseButton::Left => GlobeButton::Primary,
        MouseButton::Right => GlobeButton::Secondary,
        MouseButton::Middle => GlobeButton::Middle,
        _ => GlobeButton::Other,
    }
}

/// winit's positive y scrolls away from the user; globe wheel deltas are
/// positive towards the user, so the sign flips.
fn wheel_delta(delta: &MouseScrollDelta) -> Option<f32> {
    let lines = match delta {
        MouseScrollDelta::LineDelta(_, y) => f64::from(*y),
        MouseScrollDelta::PixelDelta(pos) => pos.y / PIXELS_PER_LINE,
    };
    lines.is_finite().then_some(-lines as f32)
}

fn touch_event(touch: &Touch) -> InputEvent {
    let pointer = PointerSample::touch(
        touch.id,
        Vec2::new(touch.location.x as f32, touch.location.y as f32),
    );
    match touch.phase {
        TouchPhase::Started => InputEvent::PointerDown {
            pointer,
            button: GlobeButton::Primary,
        },
        TouchPhase::Moved => InputEvent::PointerMove(pointer),
        TouchPhase::Ended => InputEvent::PointerUp(pointer),
        TouchPhase::Cancelled => InputEvent::PointerCancel(pointer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn scrolling_up_zooms_in() {
        assert_eq!(wheel_delta(&MouseScrollDelta::LineDelta(0.0, 1.0)), Some(-1.0));
        assert_eq!(
            wheel_delta(&MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -240.0))),
            Some(2.0)
        );
        assert_eq!(wheel_delta(&MouseScrollDelta::LineDelta(0.0, f32::NAN)), None);
    }

    #[test]
    fn buttons_map_to_globe_buttons() {
        assert_eq!(map_button(MouseButton::Left), GlobeButton::Primary);
        assert_eq!(map_button(MouseButton::Right), GlobeButton::Secondary);
        assert_eq!(map_button(MouseButton::Back), GlobeButton::Other);
    }
}
