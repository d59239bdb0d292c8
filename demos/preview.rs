//! Interactive card preview.
//!
//! Usage: `cargo run --example preview -- [theme] [format]`, e.g. `lunar quadfold`.
//!
//! Space toggles the fold, 1/2/3 switch format, dragging orbits the camera, the wheel zooms
//! and Escape closes the preview.

use foldcard::{
    CardConfiguration, CardFormat, CardPreview, FrameClock, ImageSource, InputEvent,
    PreviewSettings, Renderer, RendererError, Theme,
};
use foldcard_test_scenes::card_image_data_uri;
use futures::executor::block_on;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

struct App<'a> {
    config: CardConfiguration,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer<'a>>,
    preview: Option<CardPreview>,
    clock: FrameClock,
    dragging: bool,
    cursor: Option<(f64, f64)>,
}

impl App<'_> {
    fn new(config: CardConfiguration) -> Self {
        Self {
            config,
            window: None,
            renderer: None,
            preview: None,
            clock: FrameClock::new(),
            dragging: false,
            cursor: None,
        }
    }

    fn send(&mut self, event_loop: &ActiveEventLoop, event: InputEvent) {
        let Some(preview) = &mut self.preview else {
            return;
        };
        if !preview.handle_input(event) {
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for App<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes().with_title("foldcard preview"))
                .expect("To create the window"),
        );
        let size = window.inner_size();

        let renderer = block_on(Renderer::new(
            window.clone(),
            (size.width, size.height),
            true,
        ))
        .expect("To create the renderer");

        let preview = CardPreview::mount(
            self.config.clone(),
            PreviewSettings::default().with_viewport(size.width, size.height),
            || tracing::info!("preview closed"),
        )
        .expect("To build the card");

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.preview = Some(preview);
        self.clock = FrameClock::new();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.send(event_loop, InputEvent::Close),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize((size.width, size.height));
                }
                self.send(
                    event_loop,
                    InputEvent::Resize {
                        width: size.width,
                        height: size.height,
                    },
                );
                window.request_redraw();
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.logical_key.as_ref() {
                    Key::Named(NamedKey::Space) => self.send(event_loop, InputEvent::Toggle),
                    Key::Named(NamedKey::Escape) => self.send(event_loop, InputEvent::Close),
                    Key::Character(digit) => {
                        let format = match digit {
                            "1" => CardFormat::Single,
                            "2" => CardFormat::Bifold,
                            "3" => CardFormat::Quadfold,
                            _ => return,
                        };
                        if let Some(preview) = &mut self.preview {
                            if let Err(error) = preview.set_format(format) {
                                tracing::warn!(%error, "format change failed");
                            }
                        }
                    }
                    _ => {}
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace((position.x, position.y));
                if let (true, Some((x, y))) = (self.dragging, previous) {
                    self.send(
                        event_loop,
                        InputEvent::Drag {
                            dx: (position.x - x) as f32,
                            dy: (position.y - y) as f32,
                        },
                    );
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 40.0,
                };
                self.send(event_loop, InputEvent::Scroll { delta });
            }
            WindowEvent::RedrawRequested => {
                let (elapsed, _) = self.clock.tick();
                let (Some(preview), Some(renderer)) = (&mut self.preview, &mut self.renderer)
                else {
                    return;
                };
                let Some(frame) = preview.frame(elapsed) else {
                    event_loop.exit();
                    return;
                };
                match renderer.render(&frame) {
                    Ok(()) => window.request_redraw(),
                    Err(RendererError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        event_loop.exit()
                    }
                    Err(error) => {
                        tracing::error!(%error, "render failed");
                        window.request_redraw();
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let theme = args
        .next()
        .and_then(|value| value.parse().ok())
        .unwrap_or(Theme::NewYear);
    let format = args
        .next()
        .and_then(|value| value.parse().ok())
        .unwrap_or(CardFormat::Bifold);

    let image = ImageSource::data_uri(card_image_data_uri(200, 267, [180, 30, 40, 255]));
    let config = CardConfiguration::new(image, theme, format);

    let event_loop = EventLoop::new().expect("To create the event loop");
    let mut app = App::new(config);
    let _ = event_loop.run_app(&mut app);
}
