use std::time::{Duration, Instant};

/// Minimum wall-clock gap between two executed redraws.
pub const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// Gates full redraws to at most one per interval.
#[derive(Debug, Clone)]
pub struct ThrottleClock {
    interval: Duration,
    last_redraw: Option<Instant>,
}

impl Default for ThrottleClock {
    fn default() -> Self {
        Self::new(REDRAW_INTERVAL)
    }
}

impl ThrottleClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_redraw: None,
        }
    }

    /// Returns true and records `now` when a redraw is due: nothing has been
    /// drawn yet, or at least one interval passed since the last redraw.
    pub fn should_redraw(&mut self, now: Instant) -> bool {
        let due = self
            .last_redraw
            .map(|last| now.saturating_duration_since(last) >= self.interval)
            .unwrap_or(true);
        if due {
            self.last_redraw = Some(now);
        }
        due
    }

    pub fn last_redraw(&self) -> Option<Instant> {
        self.last_redraw
    }
}

/// Caps the redraw loop at a target frame rate and tracks the on-screen rate
/// metric.
#[derive(Debug, Clone)]
pub struct FramePacer {
    frame_time: Option<Duration>,
    last_tick: Option<Instant>,
    last_observed: Instant,
}

impl FramePacer {
    /// A `frame_rate` of zero leaves the pacer without a frame budget and
    /// every [`FramePacer::pace`] call returns immediately.
    pub fn new(frame_rate: u32, started: Instant) -> Self {
        let frame_time = if frame_rate == 0 {
            tracing::error!("frame clock unavailable (frame rate 0), pacing disabled");
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / frame_rate as f64))
        };

        Self {
            frame_time,
            last_tick: None,
            last_observed: started,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.frame_time.is_some()
    }

    /// Sleeps for whatever is left of the current frame budget.
    pub fn pace(&mut self) {
        let Some(frame_time) = self.frame_time else {
            return;
        };

        let now = Instant::now();
        if let Some(last) = self.last_tick {
            let spent = now.saturating_duration_since(last);
            if spent < frame_time {
                std::thread::sleep(frame_time - spent);
            }
        }
        self.last_tick = Some(Instant::now());
    }

    /// Seconds since the previous observation divided by 60.
    pub fn observe_rate(&mut self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_observed);
        self.last_observed = now;
        elapsed.as_secs_f64() / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_always_redraws() {
        let mut clock = ThrottleClock::default();
        assert!(clock.should_redraw(Instant::now()));
    }

    #[test]
    fn suppresses_redraws_inside_the_interval() {
        let mut clock = ThrottleClock::default();
        let start = Instant::now();

        assert!(clock.should_redraw(start));
        assert!(!clock.should_redraw(start + Duration::from_millis(20)));
        assert!(!clock.should_redraw(start + Duration::from_millis(99)));
        assert!(clock.should_redraw(start + Duration::from_millis(100)));
        assert_eq!(clock.last_redraw(), Some(start + Duration::from_millis(100)));
    }

    #[test]
    fn disabled_pacer_returns_immediately() {
        let mut pacer = FramePacer::new(0, Instant::now());
        assert!(!pacer.is_enabled());

        let start = Instant::now();
        pacer.pace();
        pacer.pace();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn pacer_holds_the_frame_budget() {
        let mut pacer = FramePacer::new(50, Instant::now());
        pacer.pace();
        let start = Instant::now();
        pacer.pace();
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn rate_is_elapsed_over_sixty() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(30, start);
        let rate = pacer.observe_rate(start + Duration::from_secs(3));
        assert!((rate - 0.05).abs() < 1e-9);
    }
}
