//! Navigation and hit-testing core for an interactive country globe.
//!
//! Window-independent: the shell translates platform events into
//! [`InputEvent`]s, calls [`GlobeSession::frame`] once per frame and runs the
//! [`RebuildJob`]s it hands out on a worker thread.

pub mod camera;
pub mod geo;
pub mod input;
pub mod navigation;
pub mod orbit;
pub mod outline;
pub mod picking;
pub mod rebuild;
pub mod session;
pub mod state;
pub mod zoom;

pub use camera::GlobeCamera;
pub use geo::{project, GeoCoordinate};
pub use input::{
    EventResponse, EventTopic, InputEvent, InputHub, MouseButton, PointerId, PointerKind,
    PointerSample, Subscription, MOUSE_POINTER,
};
pub use navigation::{Navigator, NavigatorBindings};
pub use orbit::{DragState, OrbitController, Orientation};
pub use outline::{
    graticule_segments, CountryOutline, OutlineBuilder, OutlineId, OutlineSet, VisualState,
    GRATICULE_STEP_DEG,
};
pub use picking::{HoverPicker, LineHit, Ray};
pub use rebuild::{OutlineRegistry, RebuildJob, RebuildTicket, RebuildTracker};
pub use session::{FrameOutcome, GlobeSession};
pub use state::{AppState, HoveredCountry, StateSink};
pub use zoom::{PinchState, ZoomController};
