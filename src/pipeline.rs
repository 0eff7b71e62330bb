use crate::error::{RenderError, Result};
use crate::mixer::{apply_source_policy, overlay_tone};
use crate::normalizer::normalize_pair;
use crate::profile::Profile;
use crate::shaper::{shape_pair, target_len};
use crate::types::*;
use crate::wav_writer;
use log::{debug, info};
use std::time::Instant;

/// Render the full program and encode it as a 16-bit stereo WAV.
///
/// Pure and synchronous: the same inputs give the same bytes, and nothing
/// is shared between calls. The caller owns the returned container.
pub fn render(audio: &DecodedAudio, params: &RenderParams, profile: &Profile) -> Result<PcmContainer> {
    let start = Instant::now();
    let program = render_buffer(audio, params, profile)?;
    let wav = wav_writer::encode(&program.left, &program.right, program.sample_rate)?;
    info!(
        "Rendered {:.1}s program ({} bytes) in {:.2?}",
        wav.duration_secs(),
        wav.len(),
        start.elapsed()
    );
    Ok(wav)
}

/// Everything up to (not including) encoding.
///
/// `params.target_level_dbfs` must equal the profile's target; a render
/// never mixes one deployment's level with another's duck and mapping.
/// Size limits are checked before any buffer is allocated.
///
/// # Stages
///
/// 1. Loop/trim both channels to `duration × sample_rate`.
/// 2. Normalize each channel to the target RMS on its own gain.
/// 3. Silence (solo) or duck the source per the profile.
/// 4. Pick tone frequencies from the base frequency and task.
/// 5. Map amplitude percents to linear levels.
/// 6. Synthesize each tone onto its source channel and hard-clip.
pub fn render_buffer(audio: &DecodedAudio, params: &RenderParams, profile: &Profile) -> Result<StereoBuffer> {
    params.validate()?;
    if params.target_level_dbfs != profile.target_level_dbfs {
        return Err(RenderError::Config(format!(
            "target level {} dBFS does not match profile '{}' ({} dBFS)",
            params.target_level_dbfs, profile.name, profile.target_level_dbfs
        )));
    }
    let sample_rate = audio.sample_rate();
    let out_len = target_len(params.target_duration_seconds, sample_rate)?;
    wav_writer::data_size_for(out_len)?;
    wav_writer::byte_rate_for(sample_rate)?;
    info!("Render: {}  profile={}", params, profile.name);

    let (mut left, mut right) = shape_pair(audio.left(), audio.right(), out_len);
    debug!(
        "Shaped {} → {} samples per channel ({:.2}s source)",
        audio.len(),
        out_len,
        audio.duration_secs()
    );

    normalize_pair(&mut left, &mut right, params.target_level_dbfs);

    apply_source_policy(&mut left, profile.duck, params.solo_tone);
    apply_source_policy(&mut right, profile.duck, params.solo_tone);

    let left_tone = params.task.left_tone(params.base_frequency_hz);
    let right_tone = params.task.right_tone(params.base_frequency_hz);
    let left_amp = profile.tone_amplitude(params.left_percent);
    let right_amp = profile.tone_amplitude(params.right_percent);
    debug!(
        "Tones: L={:?} amp={:.5}  R={:?} amp={:.5}",
        left_tone, left_amp, right_tone, right_amp
    );

    overlay_tone(&mut left, left_tone, sample_rate, left_amp);
    overlay_tone(&mut right, right_tone, sample_rate, right_amp);

    Ok(StereoBuffer {
        left,
        right,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::test_helpers::sine_wave;
    use crate::dsp::{amp_from_db, dbfs, rms};
    use crate::error::RenderError;
    use std::f64::consts::PI;

    fn short_params(task: Task, profile: &Profile) -> RenderParams {
        let mut p = profile.params_for(task);
        p.target_duration_seconds = 1;
        p
    }

    #[test]
    fn test_solo_zero_source_is_pure_tones() {
        let sr = 44100;
        let audio = DecodedAudio::mono(vec![0.0; sr as usize], sr).unwrap();
        let profile = Profile::ducked();
        let mut params = short_params(Task::T1, &profile);
        params.solo_tone = true;
        params.left_percent = 100.0;
        params.right_percent = 100.0;

        let out = render_buffer(&audio, &params, &profile).unwrap();
        assert_eq!(out.len(), 44100);
        let amp = amp_from_db(-10.0);
        for i in (0..out.len()).step_by(97) {
            let t = i as f64 / sr as f64;
            let l = (amp * (2.0 * PI * 100.0 * t).sin()) as f32;
            let r = (amp * (2.0 * PI * 110.5 * t).sin()) as f32;
            assert_eq!(out.left[i], l, "left sample {}", i);
            assert_eq!(out.right[i], r, "right sample {}", i);
        }
    }

    #[test]
    fn test_task3_right_frequency_switches_at_midpoint() {
        let sr = 8000;
        let audio = DecodedAudio::mono(vec![0.0; 100], sr).unwrap();
        let profile = Profile::direct();
        let mut params = short_params(Task::T3, &profile);
        params.solo_tone = true;
        params.target_duration_seconds = 2;
        params.right_percent = 50.0;

        let out = render_buffer(&audio, &params, &profile).unwrap();
        let amp = profile.tone_amplitude(50.0);
        let half = out.len() / 2;
        for &i in &[0, 1, half - 1, half, half + 1, out.len() - 1] {
            let t = i as f64 / sr as f64;
            let f = if i < half { 105.5 } else { 101.75 };
            let want = (amp * (2.0 * PI * f * t).sin()) as f32;
            assert_eq!(out.right[i], want, "sample {}", i);
        }
    }

    #[test]
    fn test_source_is_normalized_and_ducked() {
        let sr = 8000;
        let src = sine_wave(300.0, 0.01, sr, sr as usize);
        let audio = DecodedAudio::mono(src, sr).unwrap();
        let profile = Profile::ducked();
        let mut params = short_params(Task::T2, &profile);
        params.left_percent = 0.0;
        params.right_percent = 0.0;

        let out = render_buffer(&audio, &params, &profile).unwrap();
        // -14 dBFS source, -6 dB duck, plus a -40 dB tone that barely moves the RMS.
        let level = dbfs(rms(&out.left));
        assert!((level - -20.0).abs() < 0.1, "level={}", level);
    }

    #[test]
    fn test_output_never_clips_past_full_scale() {
        let sr = 8000;
        let src: Vec<f32> = (0..800).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let audio = DecodedAudio::mono(src, sr).unwrap();
        let profile = Profile::direct();
        let mut params = short_params(Task::T1, &profile);
        params.left_percent = 100.0;
        params.right_percent = 100.0;

        let out = render_buffer(&audio, &params, &profile).unwrap();
        assert!(out.left.iter().chain(&out.right).all(|s| s.abs() <= 1.0));
        assert!(out.left.iter().any(|&s| s == 1.0 || s == -1.0), "expected clipping");
    }

    #[test]
    fn test_rejects_bad_params_before_work() {
        let audio = DecodedAudio::mono(vec![0.1; 10], 8000).unwrap();
        let profile = Profile::ducked();
        let mut params = short_params(Task::T1, &profile);
        params.right_percent = -1.0;
        let err = render(&audio, &params, &profile).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ParameterOutOfRange { name: "right_percent", .. }
        ));
    }

    #[test]
    fn test_rejects_target_that_disagrees_with_profile() {
        let audio = DecodedAudio::mono(vec![0.1; 10], 8000).unwrap();
        let params = short_params(Task::T1, &Profile::ducked());
        let err = render_buffer(&audio, &params, &Profile::direct()).unwrap_err();
        assert!(matches!(err, RenderError::Config(_)), "err={}", err);
    }

    #[test]
    fn test_oversized_program_rejected_before_shaping() {
        // 2e9 frames per channel would need tens of GB if it got as far as shaping.
        let audio = DecodedAudio::mono(vec![0.1], 2_000_000_000).unwrap();
        let profile = Profile::ducked();
        let params = short_params(Task::T1, &profile);
        let err = render_buffer(&audio, &params, &profile).unwrap_err();
        assert!(matches!(err, RenderError::ContainerTooLarge { samples: 2_000_000_000 }));

        let audio = DecodedAudio::mono(vec![0.1], 44100).unwrap();
        let mut params = short_params(Task::T1, &profile);
        params.target_duration_seconds = u32::MAX;
        let err = render(&audio, &params, &profile).unwrap_err();
        assert!(matches!(err, RenderError::ContainerTooLarge { .. }));
    }

    #[test]
    fn test_render_is_deterministic() {
        let sr = 8000;
        let audio = DecodedAudio::mono(sine_wave(220.0, 0.3, sr, 1234), sr).unwrap();
        let profile = Profile::ducked();
        let params = short_params(Task::T3, &profile);
        let a = render(&audio, &params, &profile).unwrap();
        let b = render(&audio, &params, &profile).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 44 + 4 * 8000);
        assert_eq!(a.frames(), 8000);
    }
}
