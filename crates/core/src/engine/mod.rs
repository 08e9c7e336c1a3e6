//! The session object callers drive: one [`Visualizer`] per animation.

use std::{
    collections::BTreeMap,
    fmt,
    time::{Duration, Instant},
};

use crate::{
    backend::{AudioSink, DisplayBackend, HeadlessAudio, HeadlessDisplay, InputEvent},
    cache::{SurfaceCache, WaveformCache},
    config::{AudioConfig, ScopeConfig, MIN_DIMENSION},
    diff::{self, BarDelta, DiffEngine, Traversal},
    pause::{PauseController, PauseState, WaitOutcome},
    render::{self, Canvas, RenderPipeline, StatusLine},
    synth::WaveformSynthesizer,
    timeline::{FramePacer, ThrottleClock},
    Result, ScopeError,
};

/// What a call to [`Visualizer::update`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The session is released; nothing happened.
    Rejected,
    /// Counted, but inside the redraw interval so nothing was drawn.
    Throttled,
    /// A full frame was drawn and changed bars were highlighted.
    Redrawn,
}

/// Bookkeeping for one animation run.
#[derive(Debug, Clone)]
pub struct Session {
    iterations: u64,
    redraws: u64,
    started: Instant,
    finish_time: Option<Duration>,
    released: bool,
    length_warned: bool,
}

impl Session {
    fn new(started: Instant) -> Self {
        Self {
            iterations: 0,
            redraws: 0,
            started,
            finish_time: None,
            released: false,
            length_warned: false,
        }
    }

    /// Sum of `update_factor` over every accepted update.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Updates that passed the throttle and drew a frame.
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Time from construction to release, set once released.
    pub fn finish_time(&self) -> Option<Duration> {
        self.finish_time
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn length_warned(&self) -> bool {
        self.length_warned
    }
}

/// Live bar-chart animation of an array that an external algorithm mutates,
/// with optional sonification of every changed bar.
///
/// All work happens on the caller's thread inside [`Visualizer::update`] and
/// [`Visualizer::release`]. Tone playback blocks, so with sonification on the
/// audio effectively paces the animation.
pub struct Visualizer {
    config: ScopeConfig,
    display: Option<Box<dyn DisplayBackend>>,
    audio: Option<Box<dyn AudioSink>>,
    canvas: Canvas,
    pipeline: RenderPipeline,
    waveforms: WaveformCache,
    surfaces: SurfaceCache,
    diff: DiffEngine,
    throttle: ThrottleClock,
    pacer: FramePacer,
    pause: PauseController,
    session: Session,
    exit_hook: fn(i32) -> !,
}

impl Visualizer {
    /// Opens a native window and, when sonification is on, the default
    /// audio device.
    #[cfg(feature = "native")]
    pub fn open(config: ScopeConfig) -> Result<Self> {
        use crate::backend::{speaker::Speaker, window::WindowDisplay};

        Self::with_backends(
            config,
            |width, height, caption| {
                Ok(Box::new(WindowDisplay::open(width, height, caption)?) as Box<dyn DisplayBackend>)
            },
            |audio| Ok(Box::new(Speaker::open(audio)?) as Box<dyn AudioSink>),
        )
    }

    /// Runs against in-memory backends: frames and tones are produced but
    /// nothing is shown or played.
    pub fn headless(config: ScopeConfig) -> Result<Self> {
        Self::with_backends(
            config,
            |_, _, _| Ok(Box::new(HeadlessDisplay::new()) as Box<dyn DisplayBackend>),
            |_| Ok(Box::new(HeadlessAudio::new()) as Box<dyn AudioSink>),
        )
    }

    /// Builds a session on caller-provided backends. `open_display` receives
    /// the clamped geometry and the caption; `open_audio` is only called when
    /// sonification is enabled.
    pub fn with_backends<D, A>(config: ScopeConfig, open_display: D, open_audio: A) -> Result<Self>
    where
        D: FnOnce(u32, u32, &str) -> Result<Box<dyn DisplayBackend>>,
        A: FnOnce(&AudioConfig) -> Result<Box<dyn AudioSink>>,
    {
        let mut config = config;
        let (level, fell_back) = config.resolve_log_level();
        if fell_back {
            tracing::warn!(
                requested = config.log_level.as_deref().unwrap_or_default(),
                "invalid logging level, defaulting to {level}"
            );
            config.log_level = Some(level.to_string());
        }

        tracing::info!("initializing display");
        config.width = clamp_dimension("width", config.width);
        config.height = clamp_dimension("height", config.height);

        let synth = WaveformSynthesizer::from_config(&config.audio)?;

        let mut display = open_display(config.width, config.height, &config.caption).map_err(|err| {
            tracing::error!(error = %err, "error initializing display");
            err
        })?;
        display.set_caption(&config.caption);
        tracing::debug!(width = config.width, height = config.height, caption = %config.caption, "display set");

        let audio = if config.sonification {
            Some(open_audio(&config.audio)?)
        } else {
            None
        };

        let started = Instant::now();
        let mut canvas = Canvas::new(config.width, config.height);
        canvas.fill(config.background);

        let visualizer = Self {
            display: Some(display),
            audio,
            canvas,
            pipeline: RenderPipeline::new(&config),
            waveforms: WaveformCache::new(synth, config.sound_duration),
            surfaces: SurfaceCache::new(),
            diff: DiffEngine::new(),
            throttle: ThrottleClock::default(),
            pacer: FramePacer::new(config.frame_rate, started),
            pause: PauseController::new(config.pause_key),
            session: Session::new(started),
            exit_hook: std::process::exit,
            config,
        };

        tracing::info!("display initialized successfully");
        Ok(visualizer)
    }

    /// Replaces the function called when a quit signal arrives during
    /// [`Visualizer::update`] or [`Visualizer::pause`]. Defaults to
    /// [`std::process::exit`].
    pub fn with_exit_hook(mut self, hook: fn(i32) -> !) -> Self {
        self.exit_hook = hook;
        self
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn finish_time(&self) -> Option<Duration> {
        self.session.finish_time
    }

    pub fn pause_state(&self) -> PauseState {
        self.pause.state()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn waveforms(&self) -> &WaveformCache {
        &self.waveforms
    }

    pub fn surfaces(&self) -> &SurfaceCache {
        &self.surfaces
    }

    /// Bar width in pixels for `count` bars.
    pub fn thickness(&self, count: usize) -> u32 {
        render::bar_thickness(self.config.width, count)
    }

    /// Rescales `values` into `[height / 10, height - 12]`.
    pub fn normalize(&self, values: &[u32]) -> Vec<u32> {
        render::normalize(values, self.config.height)
    }

    /// Pre-synthesizes the tones for `values` and returns every cached tone.
    /// Nothing is played.
    pub fn preprocess(&mut self, values: &[u32]) -> Result<&BTreeMap<u32, Vec<u8>>> {
        if self.session.released {
            tracing::error!("display resources were released previously, cannot preprocess");
            return Err(ScopeError::Released);
        }
        tracing::debug!(values = values.len(), "preprocessing array");
        self.waveforms.populate(values)
    }

    /// Feeds the next snapshot of the animated array.
    ///
    /// Every accepted call advances the iteration counter. At most one call
    /// per redraw interval draws: it handles pending input, draws all bars,
    /// then flashes (and plays) the bars that changed since the previous
    /// snapshot. `invert_array` draws the array mirrored; `inverse_delta`
    /// visits changed bars from last to first.
    pub fn update(&mut self, snapshot: &[u32], invert_array: bool, inverse_delta: bool) -> UpdateOutcome {
        if self.session.released {
            tracing::error!("display resources were released previously, cannot update");
            return UpdateOutcome::Rejected;
        }

        let now = Instant::now();
        self.session.iterations += self.config.update_factor;

        if snapshot.len() > self.config.width as usize && !self.session.length_warned {
            tracing::warn!(
                len = snapshot.len(),
                width = self.config.width,
                "array length is greater than display width, some elements will be ignored"
            );
            self.session.length_warned = true;
        }

        let outcome = if self.throttle.should_redraw(now) {
            self.handle_events();
            let traversal = if inverse_delta {
                Traversal::Backward
            } else {
                Traversal::Forward
            };
            self.redraw(snapshot, invert_array, traversal, now);
            self.pacer.pace();
            UpdateOutcome::Redrawn
        } else {
            UpdateOutcome::Throttled
        };

        self.diff.commit(snapshot);
        outcome
    }

    /// Blocks until the bound pause key is pressed. A quit signal while
    /// paused terminates the process without returning.
    pub fn pause(&mut self) {
        if self.session.released {
            tracing::error!("display resources were released previously, cannot pause");
            return;
        }
        let Some(display) = self.display.as_deref_mut() else {
            return;
        };
        if self.pause.block_until_resumed(display) == WaitOutcome::Quit {
            self.terminate();
        }
    }

    /// Ends the session.
    ///
    /// With a final snapshot and `do_final_render`, every bar is drawn in the
    /// completion colour left to right (playing its tone when sonification
    /// is on) and then restored right to left. With `hold`, blocks until the
    /// window is closed. Afterwards the audio device, caches, font and
    /// display are released and the finish time is recorded. A second call
    /// only logs an error.
    pub fn release(&mut self, final_snapshot: Option<&[u32]>, do_final_render: bool, hold: bool) {
        if self.session.released {
            tracing::error!("display resources were released previously, cannot release again");
            return;
        }

        if let (Some(values), true) = (final_snapshot, do_final_render) {
            tracing::debug!("updating last array image");
            self.complete(values);
            tracing::debug!("last array image updated successfully");
        }

        if hold {
            if let Some(display) = self.display.as_deref_mut() {
                self.pause.hold(display);
                tracing::debug!("display held successfully");
            }
        }

        tracing::info!("releasing resources");
        self.teardown();
        tracing::info!(
            finish_time = ?self.session.finish_time,
            "display finished gracefully"
        );
    }

    fn handle_events(&mut self) {
        let events = match self.display.as_deref_mut() {
            Some(display) => display.poll_events(),
            None => return,
        };

        for event in events {
            if event == InputEvent::Quit {
                self.terminate();
            }
            if self.config.allow_pause && self.pause.is_bound(&event) {
                self.pause();
            }
        }
    }

    fn redraw(&mut self, snapshot: &[u32], invert_array: bool, traversal: Traversal, now: Instant) {
        let deltas = self.diff.compare(snapshot);
        let mut bars = if invert_array {
            diff::mirrored(&deltas)
        } else {
            deltas
        };
        self.fit_to_height(&mut bars);

        let thickness = self.thickness(bars.len());
        let rate = self.pacer.observe_rate(now);
        let status = self.status_line(now, rate, bars.len());

        self.pipeline
            .compose(&mut self.canvas, &mut self.surfaces, &bars, thickness, &status);
        self.present();

        let highlight = self.pipeline.highlight_color();
        let normal = self.pipeline.bar_color();
        for bar in diff::pending(&bars, traversal) {
            self.pipeline
                .paint(&mut self.canvas, &mut self.surfaces, &bar, thickness, highlight);
            self.present();
            if self.config.sonification {
                self.play(bar.value);
            }
            self.pipeline
                .paint(&mut self.canvas, &mut self.surfaces, &bar, thickness, normal);
            self.present();
        }

        self.session.redraws += 1;
    }

    /// Unthrottled completion pass over the final snapshot.
    fn complete(&mut self, values: &[u32]) {
        let mut bars = diff::diff(values, values);
        self.fit_to_height(&mut bars);
        let thickness = self.thickness(bars.len());

        let now = Instant::now();
        let rate = self.pacer.observe_rate(now);
        let status = self.status_line(now, rate, bars.len());
        self.pipeline
            .compose(&mut self.canvas, &mut self.surfaces, &bars, thickness, &status);
        self.present();

        let done = self.pipeline.completion_color();
        for bar in &bars {
            self.pipeline
                .paint(&mut self.canvas, &mut self.surfaces, bar, thickness, done);
            self.present();
            if self.config.sonification {
                self.play(bar.value);
            }
        }

        let normal = self.pipeline.bar_color();
        for bar in bars.iter().rev() {
            self.pipeline
                .paint(&mut self.canvas, &mut self.surfaces, bar, thickness, normal);
            self.present();
        }
        self.diff.commit(values);
    }

    /// Rescales bar heights when the tallest bar would not fit.
    fn fit_to_height(&self, bars: &mut [BarDelta]) {
        let height = self.config.height;
        if bars.iter().any(|bar| bar.value > height) {
            let values: Vec<u32> = bars.iter().map(|bar| bar.value).collect();
            for (bar, value) in bars.iter_mut().zip(render::normalize(&values, height)) {
                bar.value = value;
            }
        }
    }

    fn status_line(&self, now: Instant, rate: f64, array_len: usize) -> StatusLine {
        StatusLine {
            algorithm: self.config.algorithm_name.clone(),
            iterations: self.config.display_iterations.then_some(self.session.iterations),
            elapsed: self
                .config
                .display_time
                .then(|| now.saturating_duration_since(self.session.started).as_secs_f64()),
            rate: self.config.display_rate.then_some(rate),
            array_len,
        }
    }

    fn present(&mut self) {
        if let Some(display) = self.display.as_deref_mut() {
            if let Err(err) = display.present(&self.canvas) {
                tracing::error!(error = %err, "failed to present frame");
            }
        }
    }

    fn play(&mut self, value: u32) {
        let Some(audio) = self.audio.as_deref_mut() else {
            return;
        };
        match self.waveforms.get_or_create(value) {
            Ok(tone) => {
                if let Err(err) = audio.write(tone) {
                    tracing::error!(error = %err, value, "failed to play tone");
                }
            }
            Err(err) => tracing::debug!(error = %err, value, "skipping tone"),
        }
    }

    /// Releases owned resources in order: audio, caches, font, display.
    fn teardown(&mut self) {
        if let Some(mut audio) = self.audio.take() {
            audio.close();
        }
        self.surfaces.clear();
        self.waveforms.clear();
        self.pipeline.release_font();
        if let Some(mut display) = self.display.take() {
            display.shutdown();
        }

        self.session.finish_time = Some(self.session.started.elapsed());
        self.session.released = true;
        tracing::debug!("finish time stored");
    }

    /// Shuts the display down and exits through the exit hook.
    fn terminate(&mut self) -> ! {
        tracing::info!("quit requested, terminating");
        if let Some(mut display) = self.display.take() {
            display.shutdown();
        }
        if let Some(mut audio) = self.audio.take() {
            audio.close();
        }
        (self.exit_hook)(0)
    }
}

impl fmt::Debug for Visualizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Visualizer")
            .field("width", &self.config.width)
            .field("height", &self.config.height)
            .field("sonification", &self.audio.is_some())
            .field("session", &self.session)
            .field("pause", &self.pause.state())
            .field("tones", &self.waveforms.len())
            .field("surfaces", &self.surfaces.len())
            .finish_non_exhaustive()
    }
}

fn clamp_dimension(name: &str, value: u32) -> u32 {
    if value < MIN_DIMENSION {
        tracing::warn!(
            "display {name} is less than {MIN_DIMENSION}, defaulting to {MIN_DIMENSION}"
        );
        MIN_DIMENSION
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_tiny_geometry() {
        let config = ScopeConfig {
            width: 5,
            height: 3,
            ..Default::default()
        };
        let vis = Visualizer::headless(config).unwrap();
        assert_eq!(vis.width(), 10);
        assert_eq!(vis.height(), 10);
        assert_eq!(vis.canvas().frame().len(), 10 * 10 * 4);
    }

    #[test]
    fn invalid_log_level_is_replaced() {
        let config = ScopeConfig {
            log_level: Some("chatty".to_string()),
            ..Default::default()
        };
        let vis = Visualizer::headless(config).unwrap();
        assert_eq!(vis.config().log_level.as_deref(), Some("info"));
    }

    #[test]
    fn display_failure_is_fatal() {
        let err = Visualizer::with_backends(
            ScopeConfig::default(),
            |_, _, _| Err(ScopeError::Display("no display server".to_string())),
            |_| Ok(Box::new(HeadlessAudio::new()) as Box<dyn AudioSink>),
        )
        .unwrap_err();
        assert!(matches!(err, ScopeError::Display(_)));
    }

    #[test]
    fn audio_only_opened_for_sonification() {
        let vis = Visualizer::with_backends(
            ScopeConfig::default(),
            |_, _, _| Ok(Box::new(HeadlessDisplay::new()) as Box<dyn DisplayBackend>),
            |_| panic!("audio must not be opened"),
        );
        assert!(vis.is_ok());
    }

    #[test]
    fn invalid_cutoff_is_rejected_at_construction() {
        let mut config = ScopeConfig::default();
        config.audio.cutoff_frequency = -1.0;
        assert!(matches!(
            Visualizer::headless(config),
            Err(ScopeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn fit_to_height_only_scales_oversized_snapshots() {
        let config = ScopeConfig {
            width: 100,
            height: 100,
            ..Default::default()
        };
        let vis = Visualizer::headless(config).unwrap();

        let mut small = diff::diff(&[10, 50, 90], &[10, 50, 90]);
        vis.fit_to_height(&mut small);
        assert_eq!(small.iter().map(|b| b.value).collect::<Vec<_>>(), vec![10, 50, 90]);

        let mut tall = diff::diff(&[100, 300, 500], &[100, 300, 500]);
        vis.fit_to_height(&mut tall);
        assert_eq!(tall.iter().map(|b| b.value).collect::<Vec<_>>(), vec![10, 49, 88]);
    }
}
