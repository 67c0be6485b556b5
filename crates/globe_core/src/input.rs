//! Input events fed to the navigation controllers, and scoped subscriptions
//! for the event sources that produce them.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use glam::Vec2;

/// Identifier of one pointer (the mouse, or one finger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointerId(pub u64);

/// The mouse has no native pointer id; it always reports this one.
pub const MOUSE_POINTER: PointerId = PointerId(u64::MAX);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Pointer identity and screen position (pixels, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub id: PointerId,
    pub kind: PointerKind,
    pub position: Vec2,
}

impl PointerSample {
    pub fn mouse(position: Vec2) -> Self {
        Self {
            id: MOUSE_POINTER,
            kind: PointerKind::Mouse,
            position,
        }
    }

    pub fn touch(id: u64, position: Vec2) -> Self {
        Self {
            id: PointerId(id),
            kind: PointerKind::Touch,
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// `button` is meaningful for mouse pointers; touches report `Primary`.
    PointerDown {
        pointer: PointerSample,
        button: MouseButton,
    },
    PointerMove(PointerSample),
    PointerUp(PointerSample),
    PointerCancel(PointerSample),
    /// Vertical wheel delta, positive when scrolling towards the user
    /// (zooms out).
    Wheel { delta_y: f32 },
    /// The window lost focus; every tracked pointer is forgotten.
    FocusLost,
}

impl InputEvent {
    pub fn topic(&self) -> EventTopic {
        match self {
            InputEvent::PointerDown { pointer, .. }
            | InputEvent::PointerMove(pointer)
            | InputEvent::PointerUp(pointer)
            | InputEvent::PointerCancel(pointer) => match pointer.kind {
                PointerKind::Mouse => EventTopic::Pointer,
                PointerKind::Touch => EventTopic::Touch,
            },
            InputEvent::Wheel { .. } => EventTopic::Wheel,
            InputEvent::FocusLost => EventTopic::Focus,
        }
    }
}

/// Returned by controllers so the caller knows whether to suppress the
/// platform's default handling and whether a redraw is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventResponse {
    pub consumed: bool,
    pub changed: bool,
}

impl EventResponse {
    pub const IGNORED: Self = Self {
        consumed: false,
        changed: false,
    };

    pub fn merge(self, other: Self) -> Self {
        Self {
            consumed: self.consumed || other.consumed,
            changed: self.changed || other.changed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventTopic {
    Pointer,
    Touch,
    Wheel,
    Focus,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: Cell<u64>,
    listeners: RefCell<BTreeMap<u64, (&'static str, Vec<EventTopic>)>>,
}

/// Tracks which event topics currently have a listener.
///
/// The host only forwards events whose topic is subscribed. Subscriptions are
/// guards: dropping a [`Subscription`] releases it, so tearing down the owner
/// cannot leave a listener behind.
#[derive(Debug, Default, Clone)]
pub struct InputHub {
    registry: Rc<Registry>,
}

impl InputHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, owner: &'static str, topics: &[EventTopic]) -> Subscription {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);
        self.registry
            .listeners
            .borrow_mut()
            .insert(id, (owner, topics.to_vec()));
        tracing::trace!(owner, ?topics, "input subscription acquired");
        Subscription {
            id,
            owner,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn is_subscribed(&self, topic: EventTopic) -> bool {
        self.registry
            .listeners
            .borrow()
            .values()
            .any(|(_, topics)| topics.contains(&topic))
    }

    pub fn accepts(&self, event: &InputEvent) -> bool {
        self.is_subscribed(event.topic())
    }

    pub fn active_subscriptions(&self) -> usize {
        self.registry.listeners.borrow().len()
    }
}

/// Live subscription; released on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    owner: &'static str,
    registry: Weak<Registry>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.listeners.borrow_mut().remove(&self.id);
            tracing::trace!(owner = self.owner, "input subscription released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_guard_releases_subscription() {
        let hub = InputHub::new();
        let pointer = hub.subscribe("orbit", &[EventTopic::Pointer, EventTopic::Focus]);
        let wheel = hub.subscribe("zoom", &[EventTopic::Wheel]);
        assert_eq!(hub.active_subscriptions(), 2);
        assert!(hub.accepts(&InputEvent::Wheel { delta_y: 1.0 }));
        assert!(hub.accepts(&InputEvent::FocusLost));
        assert!(!hub.is_subscribed(EventTopic::Touch));

        drop(wheel);
        assert!(!hub.accepts(&InputEvent::Wheel { delta_y: 1.0 }));
        assert_eq!(hub.active_subscriptions(), 1);

        drop(pointer);
        assert_eq!(hub.active_subscriptions(), 0);
        assert!(!hub.is_subscribed(EventTopic::Pointer));
    }

    #[test]
    fn guard_outliving_hub_is_harmless() {
        let hub = InputHub::new();
        let guard = hub.subscribe("orbit", &[EventTopic::Pointer]);
        drop(hub);
        drop(guard);
    }

    #[test]
    fn topic_follows_pointer_kind() {
        let mouse = InputEvent::PointerMove(PointerSample::mouse(Vec2::ZERO));
        let touch = InputEvent::PointerUp(PointerSample::touch(3, Vec2::ZERO));
        assert_eq!(mouse.topic(), EventTopic::Pointer);
        assert_eq!(touch.topic(), EventTopic::Touch);
    }
}
