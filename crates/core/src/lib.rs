//! Core library for sortscope.
//!
//! The crate renders a live bar chart of an array that some external
//! algorithm is mutating and can sonify every changed element as a short
//! tone. Each module owns one concern (tone synthesis, caching, diffing,
//! pacing, pausing, rendering, output backends) and [`Visualizer`] ties them
//! into a single session driven from the caller's thread.

pub mod backend;
pub mod cache;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod pause;
pub mod render;
pub mod synth;
pub mod timeline;

pub use backend::{AudioSink, DisplayBackend, EventSource, HeadlessAudio, HeadlessDisplay, InputEvent, Key};
pub use cache::{BarSurface, SurfaceCache, WaveformCache};
pub use config::{AudioConfig, LogLevel, Rgb, SampleFormat, ScopeConfig};
pub use diff::{BarDelta, DiffEngine, Traversal};
pub use engine::{Session, UpdateOutcome, Visualizer};
pub use error::{Result, ScopeError};
pub use pause::{PauseController, PauseState, WaitOutcome};
pub use render::{Canvas, RenderPipeline, StatusLine};
pub use synth::{EnvelopeParameters, LowPassFilter, WaveformSynthesizer};
pub use timeline::{FramePacer, ThrottleClock};
