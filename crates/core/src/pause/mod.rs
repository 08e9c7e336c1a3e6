use std::time::Duration;

use crate::backend::{EventSource, InputEvent, Key};

/// Delay between two polls while blocked.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseState {
    #[default]
    Running,
    Paused,
}

/// How a blocking wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The bound key was pressed again.
    Resumed,
    /// A quit signal arrived; the caller is expected to terminate.
    Quit,
}

/// Two-state pause machine toggled by a single bound key.
#[derive(Debug, Clone)]
pub struct PauseController {
    state: PauseState,
    bind: Key,
    poll_interval: Duration,
}

impl PauseController {
    pub fn new(bind: Key) -> Self {
        Self {
            state: PauseState::Running,
            bind,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn state(&self) -> PauseState {
        self.state
    }

    pub fn bind(&self) -> Key {
        self.bind
    }

    pub fn is_bound(&self, event: &InputEvent) -> bool {
        matches!(event, InputEvent::KeyPressed(key) if *key == self.bind)
    }

    pub fn toggle(&mut self) -> PauseState {
        self.state = match self.state {
            PauseState::Running => PauseState::Paused,
            PauseState::Paused => PauseState::Running,
        };
        self.state
    }

    /// Enters `Paused` and blocks until the bound key is pressed again.
    /// Only the bound key and quit are looked at; everything else is dropped.
    /// On quit the state stays `Paused`.
    pub fn block_until_resumed<S>(&mut self, source: &mut S) -> WaitOutcome
    where
        S: EventSource + ?Sized,
    {
        self.state = PauseState::Paused;
        tracing::info!("display paused");

        loop {
            for event in source.poll_events() {
                if event == InputEvent::Quit {
                    return WaitOutcome::Quit;
                }
                if self.is_bound(&event) {
                    self.toggle();
                    tracing::info!("display unpaused");
                    return WaitOutcome::Resumed;
                }
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    /// Blocks until a quit signal arrives, ignoring every other event.
    pub fn hold<S>(&self, source: &mut S)
    where
        S: EventSource + ?Sized,
    {
        tracing::debug!("holding display");
        loop {
            if source.poll_events().contains(&InputEvent::Quit) {
                tracing::debug!("quit received, finishing hold");
                return;
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

impl Default for PauseController {
    fn default() -> Self {
        Self::new(Key::Space)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct Script(VecDeque<Vec<InputEvent>>);

    impl Script {
        fn new(batches: Vec<Vec<InputEvent>>) -> Self {
            Self(batches.into())
        }
    }

    impl EventSource for Script {
        fn poll_events(&mut self) -> Vec<InputEvent> {
            self.0.pop_front().unwrap_or_default()
        }
    }

    #[test]
    fn toggles_between_two_states() {
        let mut pause = PauseController::default();
        assert_eq!(pause.state(), PauseState::Running);
        assert_eq!(pause.toggle(), PauseState::Paused);
        assert_eq!(pause.toggle(), PauseState::Running);
    }

    #[test]
    fn resumes_on_bound_key_only() {
        let mut pause = PauseController::new(Key::Char('p'));
        let mut source = Script::new(vec![
            vec![InputEvent::KeyPressed(Key::Space)],
            vec![],
            vec![InputEvent::KeyPressed(Key::Char('p'))],
        ]);

        assert_eq!(pause.block_until_resumed(&mut source), WaitOutcome::Resumed);
        assert_eq!(pause.state(), PauseState::Running);
        assert!(source.0.is_empty());
    }

    #[test]
    fn quit_interrupts_the_pause() {
        let mut pause = PauseController::default();
        let mut source = Script::new(vec![vec![], vec![InputEvent::Quit]]);

        assert_eq!(pause.block_until_resumed(&mut source), WaitOutcome::Quit);
        assert_eq!(pause.state(), PauseState::Paused);
    }

    #[test]
    fn hold_ignores_keys_until_quit() {
        let pause = PauseController::default();
        let mut source = Script::new(vec![
            vec![InputEvent::KeyPressed(Key::Space)],
            vec![InputEvent::KeyPressed(Key::Escape), InputEvent::Quit],
        ]);

        pause.hold(&mut source);
        assert!(source.0.is_empty());
    }
}
