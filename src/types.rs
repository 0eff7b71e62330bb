use crate::error::{RenderError, Result};
use crate::synth::Tone;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Decoded source ─────────────────────────────────────────────────────────

/// Decoded source audio: one sample sequence per output channel.
/// Mono sources carry the same samples in both channels.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    left: Vec<f32>,
    right: Vec<f32>,
    sample_rate: u32,
}

impl DecodedAudio {
    /// Build from two channels. Both must be the same non-zero length.
    pub fn new(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(RenderError::out_of_range("sample_rate", 0.0));
        }
        if left.len() != right.len() {
            return Err(RenderError::ChannelLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        if left.is_empty() {
            return Err(RenderError::EmptySource);
        }
        Ok(Self {
            left,
            right,
            sample_rate,
        })
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        let right = samples.clone();
        Self::new(samples, right, sample_rate)
    }

    /// Split interleaved frames. Channels beyond the second are ignored.
    pub fn from_interleaved(samples: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(RenderError::InvalidInputFormat("zero channels".into()));
        }
        if channels == 1 {
            return Self::mono(samples.to_vec(), sample_rate);
        }
        let frames = samples.len() / channels;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in samples.chunks_exact(channels) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        Self::new(left, right, sample_rate)
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }
}

// ─── Task presets ───────────────────────────────────────────────────────────

/// Task preset: selects the right-channel tone scheme and the amplitude
/// choices offered by the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Task {
    T1,
    T2,
    T3,
}

impl Task {
    pub const ALL: [Task; 3] = [Task::T1, Task::T2, Task::T3];

    pub fn number(self) -> u8 {
        match self {
            Task::T1 => 1,
            Task::T2 => 2,
            Task::T3 => 3,
        }
    }

    /// Right-channel tone relative to the base frequency.
    pub fn right_tone(self, base_hz: f64) -> Tone {
        match self {
            Task::T1 => Tone::Steady(base_hz + 10.5),
            Task::T2 => Tone::Steady(base_hz + 22.0),
            Task::T3 => Tone::Split {
                first: base_hz + 5.5,
                second: base_hz + 1.75,
            },
        }
    }

    /// Left channel always sits on the base frequency.
    pub fn left_tone(self, base_hz: f64) -> Tone {
        Tone::Steady(base_hz)
    }

    /// Amplitude percents offered for this task, default first.
    pub fn amplitude_choices(self) -> [f64; 3] {
        match self {
            Task::T1 => [30.0, 20.0, 40.0],
            Task::T2 => [20.0, 10.0, 30.0],
            Task::T3 => [15.0, 10.0, 20.0],
        }
    }

    pub fn default_percent(self) -> f64 {
        self.amplitude_choices()[0]
    }

    pub fn is_recommended_percent(self, percent: f64) -> bool {
        self.amplitude_choices().contains(&percent)
    }
}

impl TryFrom<u8> for Task {
    type Error = RenderError;

    fn try_from(n: u8) -> Result<Self> {
        match n {
            1 => Ok(Task::T1),
            2 => Ok(Task::T2),
            3 => Ok(Task::T3),
            other => Err(RenderError::out_of_range("task", other as f64)),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.number())
    }
}

// ─── Render parameters ──────────────────────────────────────────────────────

/// Everything one render call needs besides the source and the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderParams {
    pub base_frequency_hz: f64,
    pub task: Task,
    /// 0–100
    pub left_percent: f64,
    /// 0–100
    pub right_percent: f64,
    /// Mute the source so only the tones are heard.
    pub solo_tone: bool,
    pub target_duration_seconds: u32,
    /// RMS target for source normalization. Negative dBFS.
    pub target_level_dbfs: f64,
}

impl RenderParams {
    /// Task defaults: base frequency, task's default percents, full duration.
    pub fn for_task(task: Task, target_level_dbfs: f64) -> Self {
        Self {
            base_frequency_hz: DEFAULT_BASE_FREQ_HZ,
            task,
            left_percent: task.default_percent(),
            right_percent: task.default_percent(),
            solo_tone: false,
            target_duration_seconds: DEFAULT_DURATION_SECS,
            target_level_dbfs,
        }
    }

    /// Reject anything the pipeline cannot honor, before any work is done.
    pub fn validate(&self) -> Result<()> {
        check_percent("left_percent", self.left_percent)?;
        check_percent("right_percent", self.right_percent)?;
        if !self.base_frequency_hz.is_finite() || self.base_frequency_hz <= 0.0 {
            return Err(RenderError::out_of_range(
                "base_frequency_hz",
                self.base_frequency_hz,
            ));
        }
        if self.target_duration_seconds == 0 {
            return Err(RenderError::out_of_range("target_duration_seconds", 0.0));
        }
        if !self.target_level_dbfs.is_finite() || self.target_level_dbfs >= 0.0 {
            return Err(RenderError::out_of_range(
                "target_level_dbfs",
                self.target_level_dbfs,
            ));
        }
        Ok(())
    }
}

fn check_percent(name: &'static str, percent: f64) -> Result<()> {
    if (0.0..=100.0).contains(&percent) {
        Ok(())
    } else {
        Err(RenderError::out_of_range(name, percent))
    }
}

impl fmt::Display for RenderParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  base={:.2}Hz  L={:.0}%  R={:.0}%  solo={}  dur={}s  target={:.1}dBFS",
            self.task,
            self.base_frequency_hz,
            self.left_percent,
            self.right_percent,
            self.solo_tone,
            self.target_duration_seconds,
            self.target_level_dbfs,
        )
    }
}

// ─── Rendered program ───────────────────────────────────────────────────────

/// Mixed stereo program before encoding. Channels are always equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: u32,
}

impl StereoBuffer {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Encoded 16-bit stereo WAV bytes. Owned by whoever asked for the render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmContainer {
    bytes: Vec<u8>,
    sample_rate: u32,
    frames: usize,
}

impl PcmContainer {
    pub(crate) fn from_parts(bytes: Vec<u8>, sample_rate: u32, frames: usize) -> Self {
        Self {
            bytes,
            sample_rate,
            frames,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Total size including the header.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Sample frames (one left + one right sample each).
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

// ─── Constants ──────────────────────────────────────────────────────────────

pub const DEFAULT_BASE_FREQ_HZ: f64 = 100.0;
pub const DEFAULT_DURATION_SECS: u32 = 600;
