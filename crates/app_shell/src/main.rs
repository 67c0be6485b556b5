mod dataset;
mod input;

use anyhow::{Context, Result};
use dataset::DatasetWorker;
use globe_core::{AppState, GlobeSession, HoveredCountry, StateSink};
use input::WindowInput;
use settings::{Locale, SettingsStore, UserSettings};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::Key,
    window::{Window, WindowAttributes, WindowId},
};

const WINDOW_TITLE: &str = "Globe";
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);
const SETTING_STEP: f32 = 0.1;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings_store = SettingsStore::new().context("settings store init failed")?;
    let user_settings = match settings_store.load() {
        Ok(settings) => settings,
        Err(err) => {
            warn!("using default settings (failed to load): {err}");
            UserSettings::default()
        }
    };

    let cli_dataset = std::env::args_os().nth(1).map(PathBuf::from);
    let worker = DatasetWorker::new(dataset::dataset_paths(
        cli_dataset,
        &user_settings.dataset_paths,
    ));

    let state = AppState::new(user_settings, system_locale());
    info!(locale = state.locale().code(), "starting globe");

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = GlobeApp::new(settings_store, state, worker);
    event_loop.run_app(&mut app).context("event loop error")?;
    Ok(())
}

/// Locale from the usual POSIX environment variables.
fn system_locale() -> Locale {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .map(|tag| Locale::from_language_tag(&tag))
        .unwrap_or_default()
}

/// Window title naming the hovered country, if any.
fn window_title(hovered: Option<&HoveredCountry>) -> String {
    match hovered {
        Some(country) if country.iso_code.is_empty() => {
            format!("{WINDOW_TITLE} | {}", country.name)
        }
        Some(country) => format!("{WINDOW_TITLE} | {} ({})", country.name, country.iso_code),
        None => WINDOW_TITLE.to_string(),
    }
}

struct GlobeApp {
    window: Option<Window>,
    window_id: Option<WindowId>,
    session: GlobeSession,
    input: WindowInput,
    worker: DatasetWorker,
    settings_store: SettingsStore,
    last_frame_time: Option<Instant>,
    shown_hover: Option<HoveredCountry>,
}

impl GlobeApp {
    fn new(settings_store: SettingsStore, state: AppState, worker: DatasetWorker) -> Self {
        let mut session = GlobeSession::new(state, (1, 1));
        worker.spawn(session.request_rebuild());
        Self {
            window: None,
            window_id: None,
            session,
            input: WindowInput::default(),
            worker,
            settings_store,
            last_frame_time: None,
            shown_hover: None,
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let Key::Character(text) = &event.logical_key else {
            return;
        };
        let state = self.session.state();
        let speed = state.navigation().rotation_speed();
        let sensitivity = state.navigation().zoom_sensitivity();
        let reduced_motion = state.navigation().reduced_motion();

        match text.as_str() {
            "l" | "L" => {
                if let Some(job) = self.session.toggle_locale() {
                    self.worker.spawn(job);
                }
            }
            "m" | "M" => {
                self.session.state_mut().set_reduced_motion(!reduced_motion);
                info!(reduced_motion = !reduced_motion, "reduced motion toggled");
            }
            "[" => self.adjust_rotation_speed(speed - SETTING_STEP),
            "]" => self.adjust_rotation_speed(speed + SETTING_STEP),
            "-" => self.adjust_zoom_sensitivity(sensitivity - SETTING_STEP),
            "=" | "+" => self.adjust_zoom_sensitivity(sensitivity + SETTING_STEP),
            _ => {}
        }
    }

    fn adjust_rotation_speed(&mut self, value: f32) {
        self.session.state_mut().set_rotation_speed(value);
        let applied = self.session.state().navigation().rotation_speed();
        info!(rotation_speed = applied, "rotation speed changed");
    }

    fn adjust_zoom_sensitivity(&mut self, value: f32) {
        self.session.state_mut().set_zoom_sensitivity(value);
        let applied = self.session.state().navigation().zoom_sensitivity();
        info!(zoom_sensitivity = applied, "zoom sensitivity changed");
    }

    fn drain_rebuilds(&mut self) {
        while let Some(result) = self.worker.try_recv() {
            self.session
                .complete_rebuild(result.ticket, result.outlines);
        }
    }

    fn update_title(&mut self, hovered: Option<HoveredCountry>) {
        if hovered == self.shown_hover {
            return;
        }
        if let Some(window) = self.window.as_ref() {
            window.set_title(&window_title(hovered.as_ref()));
        }
        self.shown_hover = hovered;
    }

    fn save_settings(&self) {
        if let Err(err) = self.settings_store.save(self.session.state().settings()) {
            warn!("failed to save settings: {err}");
        }
    }
}

impl ApplicationHandler for GlobeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.session.attach();
        if self.window.is_some() {
            return;
        }

        let window = match event_loop
            .create_window(WindowAttributes::default().with_title(WINDOW_TITLE.to_string()))
        {
            Ok(window) => window,
            Err(err) => {
                error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.session.resize((size.width.max(1), size.height.max(1)));
        self.window_id = Some(window.id());
        self.window = Some(window);
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.session.detach();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if Some(window_id) != self.window_id {
            return;
        }

        // Nothing is drawn; the hover result reaches the user through the title.
        if let Some(input) = self.input.translate(&event) {
            self.session.handle_event(&input);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                self.session.resize((size.width.max(1), size.height.max(1)));
            }
            WindowEvent::CursorLeft { .. } => self.session.pointer_left(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if let Some(last) = self.last_frame_time {
            if now - last < FRAME_INTERVAL {
                event_loop.set_control_flow(ControlFlow::WaitUntil(last + FRAME_INTERVAL));
                return;
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(now + FRAME_INTERVAL));

        let dt_secs = self
            .last_frame_time
            .map(|last| (now - last).as_secs_f32())
            .unwrap_or(FRAME_INTERVAL.as_secs_f32());
        self.last_frame_time = Some(now);

        self.drain_rebuilds();
        let outcome = self.session.frame(dt_secs);
        self.update_title(outcome.hovered);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.session.detach();
        self.save_settings();
    }
}
