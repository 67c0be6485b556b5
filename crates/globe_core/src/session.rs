use glam::Vec2;
use settings::Locale;

use crate::input::{EventResponse, InputEvent, InputHub, PointerKind};
use crate::navigation::{Navigator, NavigatorBindings};
use crate::outline::OutlineSet;
use crate::picking::HoverPicker;
use crate::rebuild::{OutlineRegistry, RebuildJob, RebuildTicket};
use crate::state::{AppState, HoveredCountry, StateSink};

/// What one frame produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    /// The idle spin moved the globe.
    pub rotated: bool,
    pub hovered: Option<HoveredCountry>,
}

/// Everything the frame loop owns: navigation, outlines, hover and state.
///
/// Not `Send`; it lives on the thread that runs the event loop. Outline
/// rebuilds are handed out as [`RebuildJob`]s and come back through
/// [`GlobeSession::complete_rebuild`].
#[derive(Debug)]
pub struct GlobeSession {
    navigator: Navigator,
    registry: OutlineRegistry,
    picker: HoverPicker,
    state: AppState,
    pointer: Option<Vec2>,
    hub: InputHub,
    bindings: Option<NavigatorBindings>,
}

impl GlobeSession {
    pub fn new(state: AppState, viewport_size: (u32, u32)) -> Self {
        let mut session = Self {
            navigator: Navigator::new(viewport_size),
            registry: OutlineRegistry::new(state.locale()),
            picker: HoverPicker::default(),
            state,
            pointer: None,
            hub: InputHub::new(),
            bindings: None,
        };
        session.attach();
        session
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn outlines(&self) -> &OutlineSet {
        self.registry.current()
    }

    pub fn picker(&self) -> &HoverPicker {
        &self.picker
    }

    pub fn is_rebuild_pending(&self) -> bool {
        self.registry.is_pending()
    }

    pub fn attach(&mut self) {
        if self.bindings.is_none() {
            self.bindings = Some(self.navigator.attach(&self.hub));
        }
    }

    /// Release input subscriptions; events are ignored until
    /// [`GlobeSession::attach`] is called again.
    pub fn detach(&mut self) {
        self.bindings = None;
        self.pointer = None;
    }

    pub fn is_attached(&self) -> bool {
        self.bindings.is_some()
    }

    pub fn resize(&mut self, size: (u32, u32)) {
        self.navigator.resize(size);
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// The pointer left the window.
    pub fn pointer_left(&mut self) {
        self.pointer = None;
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> EventResponse {
        if !self.hub.accepts(event) {
            return EventResponse::IGNORED;
        }
        self.track_pointer(event);
        self.navigator.handle_event(event, self.state.navigation())
    }

    /// Start an outline rebuild for the current locale.
    pub fn request_rebuild(&mut self) -> RebuildJob {
        RebuildJob {
            ticket: self.registry.begin_rebuild(),
            locale: self.state.locale(),
        }
    }

    /// Switch locale. A change starts a rebuild, returned for the caller
    /// to run.
    pub fn set_locale(&mut self, locale: Locale) -> Option<RebuildJob> {
        if !self.state.set_locale(locale) {
            return None;
        }
        tracing::info!(locale = locale.code(), "locale changed");
        Some(self.request_rebuild())
    }

    pub fn toggle_locale(&mut self) -> Option<RebuildJob> {
        self.set_locale(self.state.locale().toggled())
    }

    /// Hand back a finished rebuild. Stale results are dropped.
    pub fn complete_rebuild(&mut self, ticket: RebuildTicket, set: OutlineSet) -> bool {
        if !self.registry.complete(ticket, set) {
            return false;
        }
        self.picker.clear_highlight(self.registry.current_mut());
        true
    }

    /// Idle rotation, then hover picking against the current outlines.
    pub fn frame(&mut self, dt_secs: f32) -> FrameOutcome {
        let rotated = self.navigator.advance(dt_secs, self.state.navigation());
        let ray = self.pointer.and_then(|p| self.navigator.pointer_ray(p));
        let hovered = self.picker.update(
            ray.as_ref(),
            self.navigator.rotation(),
            self.navigator.camera(),
            self.registry.current_mut(),
            &mut self.state,
        );
        FrameOutcome { rotated, hovered }
    }

    fn track_pointer(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown { pointer, .. } | InputEvent::PointerMove(pointer) => {
                self.pointer = Some(pointer.position);
            }
            InputEvent::PointerUp(pointer) if pointer.kind == PointerKind::Touch => {
                self.pointer = None;
            }
            InputEvent::PointerCancel(_) => self.pointer = None,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MouseButton, PointerSample};

    fn session() -> GlobeSession {
        GlobeSession::new(AppState::default(), (800, 600))
    }

    #[test]
    fn detached_session_ignores_input() {
        let mut session = session();
        session.detach();
        assert!(!session.is_attached());
        let response = session.handle_event(&InputEvent::Wheel { delta_y: 1.0 });
        assert_eq!(response, EventResponse::IGNORED);

        session.attach();
        assert!(session.handle_event(&InputEvent::Wheel { delta_y: 1.0 }).consumed);
    }

    #[test]
    fn pointer_tracking_follows_events() {
        let mut session = session();
        let at = Vec2::new(10.0, 20.0);
        session.handle_event(&InputEvent::PointerMove(PointerSample::mouse(at)));
        assert_eq!(session.pointer(), Some(at));
        session.handle_event(&InputEvent::PointerUp(PointerSample::mouse(at)));
        assert_eq!(session.pointer(), Some(at));
        session.pointer_left();
        assert_eq!(session.pointer(), None);

        session.handle_event(&InputEvent::PointerDown {
            pointer: PointerSample::touch(4, at),
            button: MouseButton::Primary,
        });
        assert_eq!(session.pointer(), Some(at));
        session.handle_event(&InputEvent::PointerUp(PointerSample::touch(4, at)));
        assert_eq!(session.pointer(), None);
    }

    #[test]
    fn unchanged_locale_does_not_rebuild() {
        let mut session = session();
        assert!(session.set_locale(Locale::English).is_none());
        let job = session.toggle_locale().unwrap();
        assert_eq!(job.locale, Locale::Russian);
        assert!(session.is_rebuild_pending());
    }
}
