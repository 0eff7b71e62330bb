//! Control-surface state: the selected source, task and amplitude choices,
//! solo toggle, and the play/stop transport.
//!
//! Every play re-renders with the current settings. The session owns the
//! most recent container and drops it as soon as a newer render or a new
//! source replaces it.

use crate::cache::{RenderCache, SourceFingerprint};
use crate::decoder::{decode_named, SourceDecoder, WavDecoder};
use crate::error::{RenderError, Result};
use crate::pipeline;
use crate::profile::Profile;
use crate::types::*;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// Where finished renders go to be heard.
pub trait PlaybackSink {
    fn play(&mut self, wav: &PcmContainer) -> Result<()>;
    fn stop(&mut self);
}

/// Writes each played render to a file, replacing the previous one.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PlaybackSink for FileSink {
    fn play(&mut self, wav: &PcmContainer) -> Result<()> {
        std::fs::write(&self.path, wav.as_bytes())?;
        info!(
            "Wrote {:.1}s ({} bytes) → {:?}",
            wav.duration_secs(),
            wav.len(),
            self.path
        );
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Keeps the last played container in memory.
#[derive(Default)]
pub struct MemorySink {
    pub last: Option<PcmContainer>,
    pub plays: usize,
    pub stops: usize,
}

impl PlaybackSink for MemorySink {
    fn play(&mut self, wav: &PcmContainer) -> Result<()> {
        self.last = Some(wav.clone());
        self.plays += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stopped,
    Playing,
}

struct Source {
    name: String,
    audio: Arc<DecodedAudio>,
    fingerprint: Option<SourceFingerprint>,
}

pub struct Session {
    profile: Profile,
    params: RenderParams,
    decoder: Box<dyn SourceDecoder + Send>,
    source: Option<Source>,
    current: Option<Arc<PcmContainer>>,
    transport: Transport,
    cache: Option<RenderCache>,
}

impl Session {
    pub fn new(profile: Profile) -> Self {
        let params = profile.params_for(Task::T1);
        Self {
            profile,
            params,
            decoder: Box::new(WavDecoder),
            source: None,
            current: None,
            transport: Transport::Stopped,
            cache: None,
        }
    }

    /// Use a different decoder, e.g. one that understands compressed audio.
    pub fn with_decoder(mut self, decoder: Box<dyn SourceDecoder + Send>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Memoize up to `capacity` renders instead of re-rendering every play.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(RenderCache::new(capacity));
        self
    }

    /// Decode and select a new source. Stops playback and releases the
    /// previous render. On failure the previous source stays selected.
    pub fn select_source(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let audio = decode_named(name, bytes, self.decoder.as_ref())?;
        info!(
            "Selected {} ({:.2}s @ {} Hz)",
            name,
            audio.duration_secs(),
            audio.sample_rate()
        );
        let fingerprint = self.cache.as_ref().map(|_| SourceFingerprint::of(&audio));
        self.source = Some(Source {
            name: name.to_string(),
            audio: Arc::new(audio),
            fingerprint,
        });
        self.current = None;
        self.transport = Transport::Stopped;
        Ok(())
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.name.as_str())
    }

    /// Switch task; both amplitudes reset to the task's default.
    pub fn set_task(&mut self, task: Task) {
        self.params.task = task;
        self.params.left_percent = task.default_percent();
        self.params.right_percent = task.default_percent();
    }

    pub fn set_left_percent(&mut self, percent: f64) -> Result<()> {
        self.params.left_percent = self.checked_percent("left_percent", percent)?;
        Ok(())
    }

    pub fn set_right_percent(&mut self, percent: f64) -> Result<()> {
        self.params.right_percent = self.checked_percent("right_percent", percent)?;
        Ok(())
    }

    pub fn set_solo(&mut self, solo: bool) {
        self.params.solo_tone = solo;
    }

    pub fn set_base_frequency(&mut self, hz: f64) -> Result<()> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(RenderError::out_of_range("base_frequency_hz", hz));
        }
        self.params.base_frequency_hz = hz;
        Ok(())
    }

    pub fn set_duration(&mut self, seconds: u32) -> Result<()> {
        if seconds == 0 {
            return Err(RenderError::out_of_range("target_duration_seconds", 0.0));
        }
        self.params.target_duration_seconds = seconds;
        Ok(())
    }

    /// Amplitude choices offered for the current task.
    pub fn amplitude_choices(&self) -> [f64; 3] {
        self.params.task.amplitude_choices()
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// The render currently loaded for playback, if any.
    pub fn current(&self) -> Option<&PcmContainer> {
        self.current.as_deref()
    }

    /// Stop if playing; otherwise render with the current settings and play.
    ///
    /// With no source selected there is nothing to play, and the transport
    /// stays stopped.
    pub fn toggle_play(&mut self, sink: &mut dyn PlaybackSink) -> Result<Transport> {
        if self.transport == Transport::Playing {
            sink.stop();
            self.transport = Transport::Stopped;
            info!("Stopped");
            return Ok(self.transport);
        }

        let Some(source) = self.source.as_ref() else {
            debug!("Play pressed with no source selected");
            return Ok(self.transport);
        };
        let wav = match (&mut self.cache, &source.fingerprint) {
            (Some(cache), Some(fp)) => cache.get_or_render(fp, &source.audio, &self.params, &self.profile),
            _ => pipeline::render(&source.audio, &self.params, &self.profile).map(Arc::new),
        };
        let wav = match wav {
            Ok(w) => w,
            Err(e) => {
                warn!("Processing failed: {}", e);
                self.transport = Transport::Stopped;
                return Err(e);
            }
        };

        // Release the superseded render before handing out the new one.
        self.current = Some(wav);
        if let Some(wav) = self.current.as_deref() {
            sink.play(wav)?;
        }
        self.transport = Transport::Playing;
        info!("Playing {} with {}", source.name, self.params);
        Ok(self.transport)
    }

    fn checked_percent(&self, name: &'static str, percent: f64) -> Result<f64> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(RenderError::out_of_range(name, percent));
        }
        if !self.params.task.is_recommended_percent(percent) {
            warn!(
                "{}={} is not one of the {} choices {:?}",
                name,
                percent,
                self.params.task,
                self.amplitude_choices()
            );
        }
        Ok(percent)
    }
}
