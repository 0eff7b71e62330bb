//! Deployment profiles: normalization target, source ducking, and the
//! percent-to-dB mapping for tone levels.
//!
//! Two profiles ship built in. Others can be loaded from a JSON file.

use crate::dsp::PercentMapping;
use crate::error::{RenderError, Result};
use crate::mixer::DuckPolicy;
use crate::types::{RenderParams, Task};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// RMS target for the source, dBFS.
    pub target_level_dbfs: f64,
    pub duck: DuckPolicy,
    pub percent_mapping: PercentMapping,
}

impl Profile {
    /// -14 dBFS source, ducked 6 dB under the tone, tones mapped -40..-10 dB.
    pub fn ducked() -> Self {
        Self {
            name: "ducked".into(),
            target_level_dbfs: -14.0,
            duck: DuckPolicy::Attenuate { db: -6.0 },
            percent_mapping: PercentMapping::LINEAR_DEFAULT,
        }
    }

    /// -10 dBFS source left untouched, tones mapped -70..0 dB.
    pub fn direct() -> Self {
        Self {
            name: "direct".into(),
            target_level_dbfs: -10.0,
            duck: DuckPolicy::None,
            percent_mapping: PercentMapping::ATTENUATION_DEFAULT,
        }
    }

    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "ducked" => Some(Self::ducked()),
            "direct" => Some(Self::direct()),
            _ => None,
        }
    }

    /// Default parameters for `task` under this profile.
    pub fn params_for(&self, task: Task) -> RenderParams {
        RenderParams::for_task(task, self.target_level_dbfs)
    }

    /// Tone amplitude for a percent control.
    pub fn tone_amplitude(&self, percent: f64) -> f64 {
        self.percent_mapping.amplitude(percent)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let profile: Profile = serde_json::from_str(&data)
            .map_err(|e| RenderError::Config(format!("{}: {}", path.display(), e)))?;
        if !profile.target_level_dbfs.is_finite() || profile.target_level_dbfs >= 0.0 {
            return Err(RenderError::Config(format!(
                "{}: target_level_dbfs must be negative, got {}",
                path.display(),
                profile.target_level_dbfs
            )));
        }
        info!("Loaded profile '{}' from {:?}", profile.name, path);
        Ok(profile)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        info!("Profile saved to {:?}", path);
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| RenderError::Config(e.to_string()))
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::ducked()
    }
}
