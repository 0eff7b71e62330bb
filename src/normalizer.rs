//! RMS loudness normalization, one gain per channel.

use crate::dsp::gain_for_target;
use log::debug;

/// Scale `samples` in place so their RMS sits at `target_db` dBFS.
/// Returns the gain that was applied. No limiting happens here.
pub fn normalize_in_place(samples: &mut [f32], target_db: f64) -> f64 {
    let gain = gain_for_target(samples, target_db);
    for s in samples.iter_mut() {
        *s = (*s as f64 * gain) as f32;
    }
    gain
}

/// Normalize each channel independently. Returns `(left_gain, right_gain)`.
pub fn normalize_pair(left: &mut [f32], right: &mut [f32], target_db: f64) -> (f64, f64) {
    let gl = normalize_in_place(left, target_db);
    let gr = normalize_in_place(right, target_db);
    debug!(
        "Normalize → {:.1} dBFS: gain L={:.4} R={:.4}",
        target_db, gl, gr
    );
    (gl, gr)
}
