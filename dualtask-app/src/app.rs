use crate::input::KeyboardState;
use anyhow::{Result, anyhow};
use dualtask_render::{SkiaRenderer, load_font};
use dualtask_tasks::{SessionConfig, SessionController, Transition};
use dualtask_timing::{Clock, FrameClock};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

/// Stimulus size the word rasters are prepared at.
const WORD_SIZE: f32 = 60.0;
/// Render passes slower than this are logged.
const SLOW_RENDER: Duration = Duration::from_millis(8);

pub struct App {
    config: SessionConfig,
    session: SessionController,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: SkiaRenderer,
    keyboard: KeyboardState,
    clock: FrameClock,
    last_frame: Option<u64>,

    should_exit: bool,
}

impl App {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let mut session = SessionController::from_config(&config)?;
        session.initialize()?;

        let font = match config.font_path.as_deref().map(load_font) {
            Some(Ok(font)) => Some(font),
            Some(Err(e)) => {
                warn!(error = %format!("{e:#}"), "font unavailable; text will not be drawn");
                None
            }
            None => {
                warn!("no font configured; text will not be drawn");
                None
            }
        };
        let mut renderer = SkiaRenderer::new(config.width, config.height, font)?;
        let words = renderer.prewarm_words(WORD_SIZE, [255, 255, 255, 255]);
        debug!(words, "word rasters prepared");

        Ok(Self {
            config,
            session,
            window: None,
            pixels: None,
            renderer,
            keyboard: KeyboardState::default(),
            clock: FrameClock::new(),
            last_frame: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "dual-task session; ENTER starts, ESC exits"
        );
        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());

        let mut attributes = Window::default_attributes()
            .with_title("Dual task")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);
        if self.config.fullscreen {
            let monitor = monitor.ok_or_else(|| anyhow!("no monitor available"))?;
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale_factor = window.scale_factor(),
            layout = ?self.session.screen_bounds().collect::<Vec<_>>(),
            "window created"
        );

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(self.config.width, self.config.height, surface)?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let now = self.clock.now();
        let dt = match self.last_frame.replace(now) {
            Some(prev) => {
                let d = Duration::from_nanos(now.saturating_sub(prev));
                self.clock.record_frame(d);
                d
            }
            None => Duration::ZERO,
        };

        let input = self.keyboard.take_frame();
        if self.session.advance(dt.as_secs_f64(), &input) == Transition::Ended {
            self.log_frame_stats();
        }

        let layers = self.session.render();
        let Some(pixels) = self.pixels.as_mut() else {
            return Ok(());
        };
        let stats = self
            .renderer
            .render_frame(&layers, pixels.frame_mut(), &self.clock)?;
        if stats.total > SLOW_RENDER {
            debug!(
                clear_ms = stats.clear.as_secs_f64() * 1e3,
                draw_ms = stats.draw.as_secs_f64() * 1e3,
                copy_ms = stats.copy.as_secs_f64() * 1e3,
                commands = stats.commands,
                "slow render"
            );
        }
        pixels.render()?;
        Ok(())
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(size.width, size.height) {
                warn!(error = %e, "failed to resize surface");
            }
        }
        debug!(width = size.width, height = size.height, "surface resized");
    }

    fn log_frame_stats(&self) {
        let stats = self.clock.frame_stats();
        info!(
            frames = stats.samples,
            avg_ms = stats.average_frame_time_ns / 1e6,
            jitter_ms = stats.jitter_ns / 1e6,
            min_ms = stats.min_frame_time_ns / 1e6,
            max_ms = stats.max_frame_time_ns / 1e6,
            fps = stats.effective_fps,
            "frame timing"
        );
        if let Some(render) = self.renderer.stage_stats("total") {
            info!(
                avg_ms = render.average_frame_time_ns / 1e6,
                max_ms = render.max_frame_time_ns / 1e6,
                "render timing"
            );
        }
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            return;
        }
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        if !self.session.phase().is_finished() {
            self.log_frame_stats();
        }
        info!(phase = ?self.session.phase(), "exiting");
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %format!("{e:#}"), "failed to create window and surface");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    error!(error = %format!("{e:#}"), "frame failed");
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if code == KeyCode::Escape && event.state.is_pressed() {
                        self.cleanup_and_exit(event_loop);
                    } else {
                        self.keyboard
                            .handle(code, event.state.is_pressed(), event.repeat);
                    }
                }
            }
            WindowEvent::Focused(false) => self.keyboard.release_all(),
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
