//! Source policy (solo / duck), summing, and hard clipping.

use crate::dsp::amp_from_db;
use crate::synth::Tone;
use serde::{Deserialize, Serialize};

/// What happens to the source when the tone is not soloed.
/// Soloing always silences the source regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DuckPolicy {
    /// Source plays at its normalized level.
    None,
    /// Fixed attenuation in dB (negative) to make room for the tone.
    Attenuate { db: f64 },
}

impl DuckPolicy {
    /// Linear gain applied to the source for a given solo state.
    pub fn source_gain(&self, solo_tone: bool) -> f64 {
        if solo_tone {
            return 0.0;
        }
        match *self {
            DuckPolicy::None => 1.0,
            DuckPolicy::Attenuate { db } => amp_from_db(db),
        }
    }
}

/// Apply the solo/duck policy to a source channel in place.
pub fn apply_source_policy(source: &mut [f32], policy: DuckPolicy, solo_tone: bool) {
    if solo_tone {
        source.fill(0.0);
        return;
    }
    let gain = policy.source_gain(false);
    if gain != 1.0 {
        for s in source.iter_mut() {
            *s = (*s as f64 * gain) as f32;
        }
    }
}

/// Sum source and tone sample by sample, clipping to [-1, 1].
pub fn mix_clip(source: &[f32], tone: &[f32]) -> Vec<f32> {
    assert_eq!(
        source.len(),
        tone.len(),
        "source and tone channels must be the same length"
    );
    source.iter().zip(tone).map(|(&s, &t)| clip_sum(s, t)).collect()
}

/// Synthesize `tone` straight onto `source`, clipping to [-1, 1].
///
/// Same samples as `mix_clip(source, &synthesize(tone, source.len(), ..))`
/// without the intermediate tone buffer.
pub fn overlay_tone(source: &mut [f32], tone: Tone, sample_rate: u32, amplitude: f64) {
    let len = source.len();
    for (i, s) in source.iter_mut().enumerate() {
        *s = clip_sum(*s, tone.sample_at(i, len, sample_rate, amplitude));
    }
}

fn clip_sum(source: f32, tone: f32) -> f32 {
    (source as f64 + tone as f64).clamp(-1.0, 1.0) as f32
}
