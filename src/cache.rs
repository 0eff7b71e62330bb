//! Optional memo of finished renders.
//!
//! The pipeline itself never caches. Callers that re-render on every play
//! can put this in front of it; keys cover the source samples, every render
//! parameter, and the profile, so a hit is always byte-identical to a fresh
//! render.

use crate::error::Result;
use crate::pipeline;
use crate::profile::Profile;
use crate::types::*;
use log::debug;
use sha1_smol::Sha1;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// SHA-1 over the sample rate and the bit pattern of every sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFingerprint(String);

impl SourceFingerprint {
    pub fn of(audio: &DecodedAudio) -> Self {
        let mut h = Sha1::new();
        h.update(&audio.sample_rate().to_le_bytes());
        h.update(&(audio.len() as u64).to_le_bytes());
        let mut buf = Vec::with_capacity(4096 * 4);
        for channel in [audio.left(), audio.right()] {
            for chunk in channel.chunks(4096) {
                buf.clear();
                for s in chunk {
                    buf.extend_from_slice(&s.to_bits().to_le_bytes());
                }
                h.update(&buf);
            }
        }
        Self(h.digest().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cache key: source identity + full parameter tuple + profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderKey(String);

impl RenderKey {
    pub fn new(source: &SourceFingerprint, params: &RenderParams, profile: &Profile) -> Self {
        let mut h = Sha1::new();
        h.update(source.as_str().as_bytes());
        // serde_json prints floats in shortest round-trip form, so distinct
        // values never collide.
        h.update(serde_json::to_string(params).unwrap_or_default().as_bytes());
        h.update(serde_json::to_string(profile).unwrap_or_default().as_bytes());
        Self(h.digest().to_string())
    }
}

/// Bounded, least-recently-used render cache.
pub struct RenderCache {
    capacity: usize,
    entries: HashMap<RenderKey, Arc<PcmContainer>>,
    order: VecDeque<RenderKey>,
    hits: u64,
    misses: u64,
}

impl RenderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &RenderKey) -> Option<Arc<PcmContainer>> {
        let hit = self.entries.get(key).cloned();
        if hit.is_some() {
            self.hits += 1;
            self.touch(key);
        } else {
            self.misses += 1;
        }
        hit
    }

    pub fn insert(&mut self, key: RenderKey, wav: Arc<PcmContainer>) {
        if self.entries.insert(key.clone(), wav).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.entries.remove(&old);
                debug!("Render cache full ({}), evicted oldest entry", self.capacity);
            }
        }
    }

    /// Return a cached render or produce and remember a new one.
    pub fn get_or_render(
        &mut self,
        source: &SourceFingerprint,
        audio: &DecodedAudio,
        params: &RenderParams,
        profile: &Profile,
    ) -> Result<Arc<PcmContainer>> {
        let key = RenderKey::new(source, params, profile);
        if let Some(wav) = self.get(&key) {
            debug!("Render cache hit ({} hits / {} misses)", self.hits, self.misses);
            return Ok(wav);
        }
        let wav = Arc::new(pipeline::render(audio, params, profile)?);
        self.insert(key, wav.clone());
        Ok(wav)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    fn touch(&mut self, key: &RenderKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}
