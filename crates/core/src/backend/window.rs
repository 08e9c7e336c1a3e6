//! Native window output.
//!
//! - `winit` for the window and input, pumped from the caller's thread
//! - `pixels` for the RGBA framebuffer (pinned to the raw-window-handle 0.5 bridge)

use std::time::Duration;

use pixels::{Pixels, SurfaceTexture};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{Key as WinitKey, NamedKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowBuilder},
};

use super::{DisplayBackend, EventSource, InputEvent, Key};
use crate::{render::Canvas, Result, ScopeError};

/// A fixed-size window whose contents mirror the engine's canvas.
pub struct WindowDisplay {
    // Declared before `window` so the GPU surface is dropped first.
    pixels: Pixels,
    window: Window,
    event_loop: EventLoop<()>,
    closed: bool,
}

impl WindowDisplay {
    pub fn open(width: u32, height: u32, caption: &str) -> Result<Self> {
        let event_loop = EventLoop::new().map_err(|err| ScopeError::Display(err.to_string()))?;
        let window = WindowBuilder::new()
            .with_title(caption)
            .with_inner_size(LogicalSize::new(width, height))
            .with_resizable(false)
            .build(&event_loop)
            .map_err(|err| ScopeError::Display(err.to_string()))?;

        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, &window);
        let pixels =
            Pixels::new(width, height, surface).map_err(|err| ScopeError::Display(err.to_string()))?;

        tracing::debug!(width, height, "window opened");
        Ok(Self {
            pixels,
            window,
            event_loop,
            closed: false,
        })
    }
}

impl EventSource for WindowDisplay {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        if self.closed {
            return vec![InputEvent::Quit];
        }

        let mut events = Vec::new();
        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _| match event {
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => events.push(InputEvent::Quit),
                Event::WindowEvent {
                    event:
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key,
                                    state: ElementState::Pressed,
                                    repeat: false,
                                    ..
                                },
                            ..
                        },
                    ..
                } => {
                    if let Some(key) = map_key(&logical_key) {
                        events.push(InputEvent::KeyPressed(key));
                    }
                }
                _ => {}
            });

        if let PumpStatus::Exit(code) = status {
            tracing::debug!(code, "event loop exited");
            events.push(InputEvent::Quit);
        }
        events
    }
}

impl DisplayBackend for WindowDisplay {
    fn set_caption(&mut self, caption: &str) {
        self.window.set_title(caption);
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.pixels.frame_mut().copy_from_slice(canvas.frame());
        self.pixels
            .render()
            .map_err(|err| ScopeError::Display(err.to_string()))
    }

    fn shutdown(&mut self) {
        if !self.closed {
            self.window.set_visible(false);
            self.closed = true;
        }
    }
}

fn map_key(key: &WinitKey) -> Option<Key> {
    match key {
        WinitKey::Named(NamedKey::Space) => Some(Key::Space),
        WinitKey::Named(NamedKey::Enter) => Some(Key::Enter),
        WinitKey::Named(NamedKey::Escape) => Some(Key::Escape),
        WinitKey::Named(NamedKey::Tab) => Some(Key::Tab),
        WinitKey::Character(text) => text
            .chars()
            .next()
            .map(|c| Key::Char(c.to_ascii_lowercase())),
        _ => None,
    }
}
