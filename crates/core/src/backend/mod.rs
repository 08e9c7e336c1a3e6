//! Output seams of the engine: the surface frames are presented on, the
//! device tones are written to and the source of window input events.
//!
//! [`headless`] provides in-memory implementations used by tests and by
//! tracing-only runs. With the `native` feature enabled, [`window`] opens a
//! real window through winit + pixels and [`speaker`] plays tones via rodio.

use serde::{Deserialize, Serialize};

use crate::{render::Canvas, Result};

pub mod headless;
#[cfg(feature = "native")]
pub mod speaker;
#[cfg(feature = "native")]
pub mod window;

pub use headless::{AudioLog, DisplayLog, HeadlessAudio, HeadlessDisplay};

/// Keys the engine can bind actions to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    #[default]
    Space,
    Enter,
    Escape,
    Tab,
    Char(char),
}

/// Input observed on the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The window was closed or the user asked to quit.
    Quit,
    KeyPressed(Key),
}

/// Anything that can be polled for pending input without blocking.
pub trait EventSource {
    fn poll_events(&mut self) -> Vec<InputEvent>;
}

/// Surface that composed frames are shown on.
pub trait DisplayBackend: EventSource {
    fn set_caption(&mut self, caption: &str);

    /// Shows `canvas` on screen, replacing the previous frame.
    fn present(&mut self, canvas: &Canvas) -> Result<()>;

    /// Tears the surface down. Called at most once by the engine.
    fn shutdown(&mut self);
}

/// Blocking PCM output.
pub trait AudioSink {
    /// Plays raw i16 little-endian mono PCM and returns once it finished.
    fn write(&mut self, pcm: &[u8]) -> Result<()>;

    /// Releases the device. Called at most once by the engine.
    fn close(&mut self);
}
