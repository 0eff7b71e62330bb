//! Sine overlay generation.
//!
//! Phase is taken from absolute time (`t = i / sample_rate`), so a `Split`
//! tone jumps in phase at the midpoint. That click is part of the expected
//! output and is not smoothed.

use std::f64::consts::PI;

/// Frequency plan for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tone {
    /// One frequency for the whole buffer.
    Steady(f64),
    /// `first` before the midpoint `floor(len / 2)`, `second` from it on.
    Split { first: f64, second: f64 },
}

impl Tone {
    /// Frequency used at sample `i` of a buffer of `len` samples.
    pub fn frequency_at(&self, i: usize, len: usize) -> f64 {
        match *self {
            Tone::Steady(f) => f,
            Tone::Split { first, second } => {
                if i < len / 2 {
                    first
                } else {
                    second
                }
            }
        }
    }

    /// Sample `i` of a `len`-sample buffer: `amplitude * sin(2π f t)`, `t = i / sample_rate`.
    pub fn sample_at(&self, i: usize, len: usize, sample_rate: u32, amplitude: f64) -> f32 {
        let t = i as f64 / sample_rate as f64;
        let f = self.frequency_at(i, len);
        (amplitude * (2.0 * PI * f * t).sin()) as f32
    }
}

/// Generate `len` samples of `amplitude * sin(2π f t)`.
pub fn synthesize(tone: Tone, len: usize, sample_rate: u32, amplitude: f64) -> Vec<f32> {
    (0..len)
        .map(|i| tone.sample_at(i, len, sample_rate, amplitude))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::test_helpers::goertzel_magnitude;

    #[test]
    fn test_split_frequency_boundary() {
        let tone = Tone::Split {
            first: 105.5,
            second: 101.75,
        };
        let len = 44101;
        let half = len / 2;
        assert_eq!(tone.frequency_at(0, len), 105.5);
        assert_eq!(tone.frequency_at(half - 1, len), 105.5);
        assert_eq!(tone.frequency_at(half, len), 101.75);
        assert_eq!(tone.frequency_at(len - 1, len), 101.75);
    }

    #[test]
    fn test_steady_matches_formula() {
        let out = synthesize(Tone::Steady(100.0), 1000, 44100, 0.5);
        for (i, &s) in out.iter().enumerate() {
            let t = i as f64 / 44100.0;
            let want = (0.5 * (2.0 * PI * 100.0 * t).sin()) as f32;
            assert_eq!(s, want, "sample {}", i);
        }
    }

    #[test]
    fn test_amplitude_bounds() {
        let out = synthesize(Tone::Steady(440.0), 48000, 48000, 0.25);
        let peak = out.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!(peak <= 0.25 && peak > 0.249, "peak={}", peak);
    }

    #[test]
    fn test_split_halves_carry_their_frequencies() {
        let sr = 8000;
        let out = synthesize(
            Tone::Split {
                first: 500.0,
                second: 1500.0,
            },
            16000,
            sr,
            0.5,
        );
        let (a, b) = out.split_at(8000);
        assert!(goertzel_magnitude(a, 500.0, sr as f64) > 10.0 * goertzel_magnitude(a, 1500.0, sr as f64));
        assert!(goertzel_magnitude(b, 1500.0, sr as f64) > 10.0 * goertzel_magnitude(b, 500.0, sr as f64));
    }

    #[test]
    fn test_split_phase_is_absolute_time() {
        // Second-half samples are computed from i / sr, not from the segment start.
        let sr = 1000;
        let len = 10;
        let out = synthesize(
            Tone::Split {
                first: 10.0,
                second: 30.0,
            },
            len,
            sr,
            1.0,
        );
        let t = 5.0 / 1000.0;
        let want = (1.0 * (2.0 * PI * 30.0 * t).sin()) as f32;
        assert_eq!(out[5], want);
    }

    #[test]
    fn test_zero_amplitude_is_silence() {
        let out = synthesize(Tone::Steady(100.0), 100, 8000, 0.0);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
