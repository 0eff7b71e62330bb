//! Level math: RMS, dBFS, normalization gain, and percent-to-level mapping.

use serde::{Deserialize, Serialize};

/// Linear levels at or below this are treated as silence.
pub const SILENCE_FLOOR: f64 = 1e-9;

/// dBFS reported for silence instead of -inf.
pub const FLOOR_DB: f64 = -120.0;

/// Root mean square of an audio buffer. Accumulates in f64 so long
/// buffers don't lose precision.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64 * s as f64).sum();
    (sum / samples.len() as f64).sqrt()
}

/// Linear level → dB relative to full scale, floored at `FLOOR_DB`.
pub fn dbfs(level: f64) -> f64 {
    if level <= SILENCE_FLOOR {
        FLOOR_DB
    } else {
        20.0 * level.log10()
    }
}

/// Inverse of `dbfs`.
pub fn amp_from_db(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Linear gain that brings the buffer's RMS to `target_db`.
///
/// Silent buffers get unity gain: there is no level to scale, and a
/// floor-based gain would just amplify numerical dust.
pub fn gain_for_target(samples: &[f32], target_db: f64) -> f64 {
    let level = rms(samples);
    if level <= SILENCE_FLOOR {
        return 1.0;
    }
    amp_from_db(target_db - dbfs(level))
}

/// How a 0–100 amplitude control maps to a tone level in dB.
///
/// Deployments pick one explicitly; the two are not equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PercentMapping {
    /// Straight line from `quiet_db` at 0% to `loud_db` at 100%.
    Linear { quiet_db: f64, loud_db: f64 },
    /// `quiet_db * (100 - p) / 100`: 0 dB at 100%, `quiet_db` at 0%.
    Attenuation { quiet_db: f64 },
}

impl PercentMapping {
    /// -40 dB .. -10 dB
    pub const LINEAR_DEFAULT: PercentMapping = PercentMapping::Linear {
        quiet_db: -40.0,
        loud_db: -10.0,
    };

    /// -70 dB .. 0 dB
    pub const ATTENUATION_DEFAULT: PercentMapping = PercentMapping::Attenuation { quiet_db: -70.0 };

    pub fn level_db(&self, percent: f64) -> f64 {
        percent_to_level_db(percent, *self)
    }

    /// Linear amplitude for a percent control.
    pub fn amplitude(&self, percent: f64) -> f64 {
        amp_from_db(self.level_db(percent))
    }
}

pub fn percent_to_level_db(percent: f64, mapping: PercentMapping) -> f64 {
    match mapping {
        PercentMapping::Linear { quiet_db, loud_db } => {
            quiet_db + (percent / 100.0) * (loud_db - quiet_db)
        }
        PercentMapping::Attenuation { quiet_db } => quiet_db * (100.0 - percent) / 100.0,
    }
}
