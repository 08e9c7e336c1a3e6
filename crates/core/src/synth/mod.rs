//! Tone synthesis: enveloped, low-passed sine pulses encoded as 16-bit PCM.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{config::AudioConfig, Result, ScopeError};

pub mod filter;

pub use filter::LowPassFilter;

/// ADSR shape applied to every synthesized tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeParameters {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level in `[0, 1]`.
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Default for EnvelopeParameters {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.2,
            sustain: 0.5,
            release: 0.1,
        }
    }
}

impl From<&AudioConfig> for EnvelopeParameters {
    fn from(config: &AudioConfig) -> Self {
        Self {
            attack: config.attack,
            decay: config.decay,
            sustain: config.sustain,
            release: config.release,
        }
    }
}

/// Sample counts of each envelope stage for a tone of a given length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeWindows {
    pub attack: usize,
    pub decay: usize,
    pub sustain: usize,
    pub release: usize,
}

impl EnvelopeParameters {
    /// Splits `total` samples into stages. Attack is clamped first, decay
    /// against what is left, then release; sustain takes the remainder.
    pub fn windows(&self, total: usize, sample_rate: u32) -> EnvelopeWindows {
        let to_samples = |seconds: f64| (seconds.max(0.0) * sample_rate as f64) as usize;

        let attack = to_samples(self.attack).min(total);
        let decay = to_samples(self.decay).min(total - attack);
        let release_wanted = to_samples(self.release);
        let sustain = total.saturating_sub(attack + decay + release_wanted);
        let release = release_wanted.min(total - attack - decay - sustain);

        EnvelopeWindows {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Per-sample gain curve of length `total`.
    pub fn curve(&self, total: usize, sample_rate: u32) -> Vec<f64> {
        let windows = self.windows(total, sample_rate);
        let mut curve = Vec::with_capacity(total);

        curve.extend(ramp(0.0, 1.0, windows.attack));
        curve.extend(ramp(1.0, self.sustain, windows.decay));
        curve.extend(std::iter::repeat(self.sustain).take(windows.sustain));
        curve.extend(ramp(self.sustain, 0.0, windows.release));
        curve.resize(total, 1.0);
        curve
    }
}

/// Linear ramp of `len` points that includes both endpoints.
fn ramp(from: f64, to: f64, len: usize) -> impl Iterator<Item = f64> {
    let step = if len > 1 {
        (to - from) / (len - 1) as f64
    } else {
        0.0
    };
    (0..len).map(move |i| from + step * i as f64)
}

/// Converts values into audible pulses. Deterministic: the same inputs always
/// produce the same bytes.
#[derive(Debug, Clone)]
pub struct WaveformSynthesizer {
    sample_rate: u32,
    amplitude: f64,
    filter: LowPassFilter,
    envelope: EnvelopeParameters,
}

impl WaveformSynthesizer {
    pub fn new(
        sample_rate: u32,
        amplitude: f64,
        cutoff: f64,
        envelope: EnvelopeParameters,
    ) -> Result<Self> {
        let filter = LowPassFilter::butterworth(cutoff, sample_rate)?;
        Ok(Self {
            sample_rate,
            amplitude,
            filter,
            envelope,
        })
    }

    pub fn from_config(config: &AudioConfig) -> Result<Self> {
        Self::new(
            config.sample_rate,
            config.amplitude,
            config.cutoff_frequency,
            EnvelopeParameters::from(config),
        )
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn envelope(&self) -> &EnvelopeParameters {
        &self.envelope
    }

    /// Number of samples a tone of `duration` seconds occupies.
    pub fn sample_count(&self, duration: f64) -> usize {
        (duration * self.sample_rate as f64).round() as usize
    }

    /// Synthesizes a tone with the configured envelope.
    pub fn tone(&self, duration: f64, frequency: f64) -> Result<Vec<u8>> {
        self.synthesize(duration, frequency, &self.envelope)
    }

    /// Renders `duration` seconds of a sine at `frequency` Hz shaped by
    /// `envelope`, low-passed without phase shift, as i16 little-endian PCM.
    pub fn synthesize(
        &self,
        duration: f64,
        frequency: f64,
        envelope: &EnvelopeParameters,
    ) -> Result<Vec<u8>> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(ScopeError::invalid(format!(
                "tone frequency must be positive, got {frequency}"
            )));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(ScopeError::invalid(format!(
                "tone duration must be non-negative, got {duration}"
            )));
        }

        let total = self.sample_count(duration);
        let rate = self.sample_rate as f64;
        let gain = envelope.curve(total, self.sample_rate);

        let shaped: Vec<f64> = gain
            .iter()
            .enumerate()
            .map(|(i, g)| self.amplitude * (2.0 * PI * frequency * i as f64 / rate).sin() * g)
            .collect();

        let filtered = self.filter.filtfilt(&shaped);
        Ok(encode_i16_le(&filtered))
    }
}

/// Rounds, clamps and packs samples as signed 16-bit little-endian PCM.
pub fn encode_i16_le(samples: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let clamped = sample.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        bytes.extend_from_slice(&clamped.to_le_bytes());
    }
    bytes
}

/// Inverse of [`encode_i16_le`]; a trailing odd byte is ignored.
pub fn decode_i16_le(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
