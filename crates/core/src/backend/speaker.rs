//! Audio device integration using rodio.

use rodio::{buffer::SamplesBuffer, OutputStream, OutputStreamHandle, Sink};

use super::AudioSink;
use crate::{config::AudioConfig, synth::decode_i16_le, Result, ScopeError};

/// Default output device. Every write blocks until the tone finished.
pub struct Speaker {
    // Dropped before the stream it plays on.
    sink: Sink,
    _handle: OutputStreamHandle,
    _stream: OutputStream,
    sample_rate: u32,
    channels: u16,
    frames_per_buffer: usize,
}

impl Speaker {
    pub fn open(config: &AudioConfig) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|err| ScopeError::Audio(format!("failed to create audio stream: {err}")))?;
        let sink = Sink::try_new(&handle)
            .map_err(|err| ScopeError::Audio(format!("failed to create audio sink: {err}")))?;

        tracing::debug!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            "audio output opened"
        );
        Ok(Self {
            sink,
            _handle: handle,
            _stream: stream,
            sample_rate: config.sample_rate,
            channels: config.channels.max(1),
            frames_per_buffer: config.frames_per_buffer.max(1),
        })
    }
}

impl AudioSink for Speaker {
    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        let channels = self.channels as usize;
        let interleaved: Vec<i16> = decode_i16_le(pcm)
            .into_iter()
            .flat_map(|sample| std::iter::repeat(sample).take(channels))
            .collect();

        for chunk in interleaved.chunks(self.frames_per_buffer * channels) {
            self.sink.append(SamplesBuffer::new(
                self.channels,
                self.sample_rate,
                chunk.to_vec(),
            ));
        }
        self.sink.sleep_until_end();
        Ok(())
    }

    fn close(&mut self) {
        self.sink.stop();
    }
}
