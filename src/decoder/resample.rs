// src/decoder/resample.rs

use rubato::{
    calculate_cutoff, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::decoder::dsp;
use crate::error::EditorError;

pub fn build_resampler(
    src_rate: u32,
    dst_rate: u32,
    channels: usize,
) -> Result<Option<SincFixedIn<f32>>, EditorError> {
    if src_rate == dst_rate {
        return Ok(None);
    }
    let ratio = dst_rate as f64 / src_rate as f64;
    let sinc_len = 256usize;
    let window = WindowFunction::BlackmanHarris2;
    let f_cutoff = calculate_cutoff(sinc_len, window);
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window,
    };
    let chunk_size = 1024;
    let r = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, channels)
        .map_err(|e| EditorError::Decode(format!("resampler init: {e}")))?;
    Ok(Some(r))
}

/// One-shot resample of an entire interleaved buffer. The decoded source is
/// in memory already, so this runs at load time rather than streaming.
pub fn resample_interleaved(
    input: &[f32],
    channels: usize,
    src_rate: u32,
    dst_rate: u32,
) -> Result<Vec<f32>, EditorError> {
    let Some(mut resampler) = build_resampler(src_rate, dst_rate, channels)? else {
        return Ok(input.to_vec());
    };

    let mut stage_planar: Vec<Vec<f32>> = vec![Vec::with_capacity(4096); channels];
    dsp::append_interleaved_to_planar(input, &mut stage_planar, channels);

    let mut out = Vec::with_capacity((input.len() as f64 * dst_rate as f64 / src_rate as f64) as usize + channels);

    loop {
        let need = resampler.input_frames_next();
        if dsp::planar_len(&stage_planar) < need {
            break;
        }
        let in_block = dsp::take_from_planar(&mut stage_planar, need);
        let mut block = resampler
            .process(&in_block, None)
            .map_err(|e| EditorError::Decode(format!("resample: {e}")))?;
        out.extend_from_slice(&dsp::interleave(block.as_mut_slice()));
    }

    // Flush whatever is left plus the filter tail.
    if dsp::planar_len(&stage_planar) > 0 {
        let remaining = dsp::planar_len(&stage_planar);
        let tail = dsp::take_from_planar(&mut stage_planar, remaining);
        let mut block = resampler
            .process_partial(Some(&tail), None)
            .map_err(|e| EditorError::Decode(format!("resample tail: {e}")))?;
        out.extend_from_slice(&dsp::interleave(block.as_mut_slice()));
    }
    let mut block = resampler
        .process_partial::<Vec<f32>>(None, None)
        .map_err(|e| EditorError::Decode(format!("resample drain: {e}")))?;
    if !block.is_empty() && !block[0].is_empty() {
        out.extend_from_slice(&dsp::interleave(block.as_mut_slice()));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_rates_pass_through() {
        let input = vec![0.1f32, -0.1, 0.2, -0.2];
        let out = resample_interleaved(&input, 2, 44100, 44100).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn upsample_roughly_doubles_frame_count() {
        let frames = 22050usize;
        let input = vec![0.0f32; frames];
        let out = resample_interleaved(&input, 1, 22050, 44100).unwrap();
        let got = out.len() as f64;
        let want = (frames * 2) as f64;
        // Sinc filters carry delay; allow a small edge margin.
        assert!((got - want).abs() < 2048.0, "got {got}, want ~{want}");
    }
}
