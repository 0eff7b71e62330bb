//! Loop or trim a source to an exact sample count.

use crate::error::{RenderError, Result};

/// Wrap-around resize: `out[i] = input[i % input.len()]`.
///
/// Short inputs repeat, long inputs are cut. There is no crossfade at the
/// wrap point. `input` must not be empty.
pub fn shape(input: &[f32], out_len: usize) -> Vec<f32> {
    assert!(!input.is_empty(), "cannot shape an empty channel");
    if input.len() == out_len {
        return input.to_vec();
    }
    input.iter().copied().cycle().take(out_len).collect()
}

/// Shape both channels of a stereo pair to the same length.
pub fn shape_pair(left: &[f32], right: &[f32], out_len: usize) -> (Vec<f32>, Vec<f32>) {
    assert_eq!(left.len(), right.len(), "channel lengths differ before shaping");
    (shape(left, out_len), shape(right, out_len))
}

/// Samples needed for `seconds` of audio at `sample_rate`.
pub fn target_len(seconds: u32, sample_rate: u32) -> Result<usize> {
    (seconds as usize)
        .checked_mul(sample_rate as usize)
        .ok_or(RenderError::ContainerTooLarge { samples: usize::MAX })
}
