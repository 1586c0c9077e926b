//! Moodscope - audio-reactive mood visualizer
//!
//! Plays a list of WAV tracks and renders a themed scene that breathes with
//! the music: star fields, rain, snow, a violet halo, rain on glass, aurora.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use moodscope::audio::DeviceElement;
use moodscope::cli::Args;
use moodscope::params::RenderConfig;
use moodscope::rendering::RenderSystem;
use moodscope::scene::{Theme, Viewport};
use moodscope::Visualizer;

/// Seek step for the arrow keys (seconds)
const SEEK_STEP_S: f64 = 5.0;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    visualizer: Visualizer<DeviceElement>,
    render_config: RenderConfig,

    // Time tracking
    start_time: Instant,
}

impl App {
    fn new(visualizer: Visualizer<DeviceElement>, render_config: RenderConfig) -> Self {
        Self {
            window: None,
            render_system: None,
            visualizer,
            render_config,
            start_time: Instant::now(),
        }
    }

    fn title(&self) -> String {
        let state = self.visualizer.state();
        let transport = self.visualizer.transport();
        let track = match transport.current_track() {
            Some(t) => format!(
                "{} ({}/{})",
                t.title,
                state.current_track_index + 1,
                transport.tracks().len()
            ),
            None => "no track".to_string(),
        };
        match &state.audio_error {
            Some(message) => format!("Moodscope - {track} - {message}"),
            None => format!(
                "Moodscope - {track} [{} / {}]",
                self.visualizer.theme(),
                self.visualizer.mood()
            ),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("Moodscope")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.render_config,
            self.visualizer.director().particle_instances(),
        ));
        match render_system {
            Ok(render_system) => self.render_system = Some(render_system),
            Err(e) => {
                error!("{}", e);
                event_loop.exit();
                return;
            }
        }

        info!("Moodscope is running: Space play/pause, N/P tracks, 1-6 themes, M mood, ESC quits");
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.visualizer.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.sync_size(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code, repeat),
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }
}

impl App {
    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode, repeat: bool) {
        let current_time = self.visualizer.state().current_time;
        match code {
            KeyCode::Escape => {
                self.visualizer.shutdown();
                event_loop.exit();
            }
            KeyCode::ArrowLeft => self
                .visualizer
                .transport_mut()
                .request_seek(current_time - SEEK_STEP_S),
            KeyCode::ArrowRight => self
                .visualizer
                .transport_mut()
                .request_seek(current_time + SEEK_STEP_S),
            _ if repeat => {}
            KeyCode::Space => self.visualizer.transport_mut().toggle_play(),
            KeyCode::KeyN => self.visualizer.transport_mut().next(),
            KeyCode::KeyP => self.visualizer.transport_mut().prev(),
            KeyCode::KeyM => self.visualizer.cycle_mood(),
            KeyCode::Digit1 => self.visualizer.set_theme(Theme::Stars),
            KeyCode::Digit2 => self.visualizer.set_theme(Theme::Rain),
            KeyCode::Digit3 => self.visualizer.set_theme(Theme::Snow),
            KeyCode::Digit4 => self.visualizer.set_theme(Theme::Halo),
            KeyCode::Digit5 => self.visualizer.set_theme(Theme::RainGlass),
            KeyCode::Digit6 => self.visualizer.set_theme(Theme::Aurora),
            _ => {}
        }
    }

    /// Render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };

        let size = window.inner_size();
        render_system.sync_size(size.width, size.height);

        let time_s = self.start_time.elapsed().as_secs_f32();
        let viewport = Viewport::new(size.width, size.height);
        let plan = self.visualizer.frame(Instant::now(), time_s, viewport);

        if let Err(e) = render_system.render(&plan) {
            error!("{}", e);
            self.visualizer.shutdown();
            event_loop.exit();
            return;
        }

        window.set_title(&self.title());
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Moodscope - audio-reactive mood visualizer");

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let element = match DeviceElement::open() {
        Ok(element) => element,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut visualizer = Visualizer::new(element, &config, args.parse_theme(), args.parse_mood());
    let tracks = args.track_list();
    if tracks.is_empty() {
        warn!("No tracks given, running in ambient mode");
    }
    visualizer.set_tracks(tracks);
    if args.autoplay {
        visualizer.transport_mut().request_play();
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("Failed to create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new(visualizer, config.render);
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("Event loop error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
