//! First-order low-pass Butterworth filter with zero-phase application.

use std::f64::consts::PI;

use crate::{Result, ScopeError};

/// Number of samples mirrored onto each end of the signal before the
/// forward-backward pass, three times the filter's coefficient count.
const PAD_LEN: usize = 6;

/// First-order IIR low-pass derived via the bilinear transform.
///
/// Coefficients are computed once; [`LowPassFilter::filtfilt`] keeps no state
/// between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPassFilter {
    b0: f64,
    b1: f64,
    a1: f64,
}

impl LowPassFilter {
    /// Designs the filter for `cutoff` Hz at `sample_rate` Hz. A cutoff at or
    /// above Nyquist yields a pass-through filter.
    pub fn butterworth(cutoff: f64, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(ScopeError::invalid("sample rate must be positive"));
        }
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(ScopeError::invalid(format!(
                "cutoff frequency must be positive, got {cutoff}"
            )));
        }

        let nyquist = sample_rate as f64 * 0.5;
        if cutoff >= nyquist {
            return Ok(Self::passthrough());
        }

        // Pre-warped analog corner.
        let k = (PI * cutoff / sample_rate as f64).tan();
        let norm = 1.0 / (1.0 + k);
        Ok(Self {
            b0: k * norm,
            b1: k * norm,
            a1: (k - 1.0) * norm,
        })
    }

    pub fn passthrough() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            a1: 0.0,
        }
    }

    pub fn coefficients(&self) -> ([f64; 2], [f64; 2]) {
        ([self.b0, self.b1], [1.0, self.a1])
    }

    /// Applies the filter forwards and then backwards so the output carries
    /// no phase shift. The signal is padded with an odd reflection of its
    /// ends and both passes start from steady-state initial conditions.
    pub fn filtfilt(&self, signal: &[f64]) -> Vec<f64> {
        let len = signal.len();
        if len == 0 {
            return Vec::new();
        }

        let pad = PAD_LEN.min(len - 1);
        let first = signal[0];
        let last = signal[len - 1];

        let mut extended = Vec::with_capacity(len + 2 * pad);
        extended.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
        extended.extend_from_slice(signal);
        extended.extend((1..=pad).map(|i| 2.0 * last - signal[len - 1 - i]));

        let zi = self.steady_state();

        let mut forward = self.lfilter(&extended, zi * extended[0]);
        forward.reverse();
        let mut backward = self.lfilter(&forward, zi * forward[0]);
        backward.reverse();

        backward.drain(..pad);
        backward.truncate(len);
        backward
    }

    /// Direct Form II Transposed pass starting from delay state `z`.
    fn lfilter(&self, input: &[f64], mut z: f64) -> Vec<f64> {
        input
            .iter()
            .map(|&x| {
                let y = self.b0 * x + z;
                z = self.b1 * x - self.a1 * y;
                y
            })
            .collect()
    }

    /// Delay state for a unit step that has already settled.
    fn steady_state(&self) -> f64 {
        (self.b1 - self.a1 * self.b0) / (1.0 + self.a1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(frequency: f64, sample_rate: u32, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f64 / sample_rate as f64).sin())
            .collect()
    }

    fn peak(signal: &[f64]) -> f64 {
        signal.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()))
    }

    #[test]
    fn passes_dc_unchanged() {
        let filter = LowPassFilter::butterworth(5_000.0, 44_100).unwrap();
        let out = filter.filtfilt(&[0.75; 64]);

        assert_eq!(out.len(), 64);
        for sample in out {
            assert_relative_eq!(sample, 0.75, epsilon = 1e-9);
        }
    }

    #[test]
    fn attenuates_above_cutoff() {
        let filter = LowPassFilter::butterworth(500.0, 44_100).unwrap();
        let low = filter.filtfilt(&sine(100.0, 44_100, 4_410));
        let high = filter.filtfilt(&sine(8_000.0, 44_100, 4_410));

        // Skip the edge transients left by the initial conditions.
        let low = peak(&low[500..3_900]);
        let high = peak(&high[500..3_900]);
        assert!(low > 0.9, "low tone should survive, got {low}");
        assert!(high < 0.1, "high tone should be cut, got {high}");
    }

    #[test]
    fn keeps_impulse_centred() {
        let filter = LowPassFilter::butterworth(2_000.0, 44_100).unwrap();
        let mut pulse = vec![0.0; 101];
        pulse[50] = 1.0;

        let out = filter.filtfilt(&pulse);
        let argmax = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();

        assert_eq!(argmax, 50);
        assert_relative_eq!(out[49], out[51], epsilon = 1e-9);
    }

    #[test]
    fn cutoff_above_nyquist_is_identity() {
        let filter = LowPassFilter::butterworth(30_000.0, 44_100).unwrap();
        assert_eq!(filter, LowPassFilter::passthrough());

        let signal = sine(440.0, 44_100, 32);
        assert_eq!(filter.filtfilt(&signal), signal);
    }

    #[test]
    fn handles_very_short_signals() {
        let filter = LowPassFilter::butterworth(5_000.0, 44_100).unwrap();
        assert!(filter.filtfilt(&[]).is_empty());
        assert_eq!(filter.filtfilt(&[0.5]).len(), 1);
        assert_eq!(filter.filtfilt(&[0.5, -0.5, 0.25]).len(), 3);
    }

    #[test]
    fn rejects_invalid_design_parameters() {
        assert!(matches!(
            LowPassFilter::butterworth(0.0, 44_100),
            Err(ScopeError::InvalidParameter(_))
        ));
        assert!(matches!(
            LowPassFilter::butterworth(1_000.0, 0),
            Err(ScopeError::InvalidParameter(_))
        ));
    }
}
