use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use super::{AudioSink, DisplayBackend, EventSource, InputEvent};
use crate::{render::Canvas, Result};

/// Everything a [`HeadlessDisplay`] observed, shared with the test or driver
/// that created it.
#[derive(Debug, Default)]
pub struct DisplayLog {
    pub presents: usize,
    pub polls: usize,
    pub captions: Vec<String>,
    pub last_frame: Option<Vec<u8>>,
    pub shutdowns: usize,
    scripted: VecDeque<Vec<InputEvent>>,
}

impl DisplayLog {
    /// Queues a batch of events, delivered by one future poll.
    pub fn script(&mut self, batch: Vec<InputEvent>) {
        self.scripted.push_back(batch);
    }
}

/// Display that keeps frames in memory and replays scripted input.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    log: Rc<RefCell<DisplayLog>>,
    retain_frames: bool,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps a copy of the most recently presented frame in the log.
    pub fn retaining_frames(mut self) -> Self {
        self.retain_frames = true;
        self
    }

    pub fn log(&self) -> Rc<RefCell<DisplayLog>> {
        Rc::clone(&self.log)
    }
}

impl EventSource for HeadlessDisplay {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut log = self.log.borrow_mut();
        log.polls += 1;
        log.scripted.pop_front().unwrap_or_default()
    }
}

impl DisplayBackend for HeadlessDisplay {
    fn set_caption(&mut self, caption: &str) {
        self.log.borrow_mut().captions.push(caption.to_string());
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.presents += 1;
        if self.retain_frames {
            log.last_frame = Some(canvas.frame().to_vec());
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.log.borrow_mut().shutdowns += 1;
    }
}

#[derive(Debug, Default)]
pub struct AudioLog {
    pub writes: usize,
    pub bytes: usize,
    pub closes: usize,
    pub last_write: Option<Vec<u8>>,
}

/// Audio sink that records what would have been played.
#[derive(Debug, Default)]
pub struct HeadlessAudio {
    log: Rc<RefCell<AudioLog>>,
}

impl HeadlessAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Rc<RefCell<AudioLog>> {
        Rc::clone(&self.log)
    }
}

impl AudioSink for HeadlessAudio {
    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.writes += 1;
        log.bytes += pcm.len();
        log.last_write = Some(pcm.to_vec());
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().closes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Key;

    #[test]
    fn replays_scripted_batches_in_order() {
        let mut display = HeadlessDisplay::new();
        let log = display.log();
        log.borrow_mut().script(vec![InputEvent::KeyPressed(Key::Space)]);
        log.borrow_mut().script(vec![InputEvent::Quit]);

        assert_eq!(display.poll_events(), vec![InputEvent::KeyPressed(Key::Space)]);
        assert_eq!(display.poll_events(), vec![InputEvent::Quit]);
        assert!(display.poll_events().is_empty());
        assert_eq!(log.borrow().polls, 3);
    }

    #[test]
    fn records_audio_writes() {
        let mut audio = HeadlessAudio::new();
        let log = audio.log();
        audio.write(&[1, 2, 3, 4]).unwrap();
        audio.close();

        let log = log.borrow();
        assert_eq!(log.writes, 1);
        assert_eq!(log.bytes, 4);
        assert_eq!(log.closes, 1);
    }
}
