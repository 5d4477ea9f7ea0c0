// src/session/export.rs

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::decoder::AudioSource;
use crate::effects::EffectSettings;
use crate::error::EditorError;
use crate::router::EffectRack;

pub const DEFAULT_BLOCK_FRAMES: usize = 1024;

/// Scale a float sample to PCM16. Clamped to [-1, 1]; negative values scale
/// by 32768, non-negative by 32767, matching the asymmetric i16 range.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Offline render of the whole source through a fresh effect chain built
/// from the settings snapshot. The live playback nodes are never touched, so
/// exporting mid-playback cannot disturb the audible chain (and vice versa).
pub fn render_with_effects(
    source: &AudioSource,
    settings: &EffectSettings,
    block_frames: usize,
) -> Vec<f32> {
    let mut rack = EffectRack::new(source.sample_rate, source.channels);
    rack.sync_params(settings);
    rack.rebuild(settings);

    let mut rendered = source.samples.clone();
    let block_len = block_frames.max(1) * source.channels;
    for block in rendered.chunks_mut(block_len) {
        rack.process(block);
    }
    rendered
}

/// Encode interleaved samples as a PCM16LE WAV: the 44-byte
/// RIFF/WAVE/fmt/data header followed by the scaled samples. Rendered fully
/// in memory so a failure never touches any destination file.
pub fn encode_wav(
    samples: &[f32],
    channels: usize,
    sample_rate: u32,
) -> Result<Vec<u8>, EditorError> {
    let spec = WavSpec {
        channels: channels as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| EditorError::Export(e.to_string()))?;
        for &sample in samples {
            writer
                .write_sample(sample_to_i16(sample))
                .map_err(|e| EditorError::Export(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| EditorError::Export(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}

/// Render + encode + write. The bytes land in a temporary sibling first and
/// are renamed into place, so the destination is either the complete file or
/// absent.
pub fn export_to_wav(
    source: &AudioSource,
    settings: &EffectSettings,
    output_path: &str,
    block_frames: usize,
) -> Result<(), EditorError> {
    log::info!("exporting {} frames to {}", source.frames(), output_path);

    let rendered = render_with_effects(source, settings, block_frames);
    let bytes = encode_wav(&rendered, source.channels, source.sample_rate)?;

    let tmp_path = format!("{output_path}.part");
    std::fs::write(&tmp_path, &bytes).map_err(|e| EditorError::Export(e.to_string()))?;
    std::fs::rename(&tmp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        EditorError::Export(e.to_string())
    })?;

    log::info!("export complete: {} bytes", bytes.len());
    Ok(())
}

/// `song.mp3` -> `song_edited.wav`, next to the input.
pub fn default_export_path(input_path: &str) -> String {
    let path = Path::new(input_path);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            dir.join(format!("{stem}_edited.wav")).to_string_lossy().into_owned()
        }
        _ => format!("{stem}_edited.wav"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn sample_scaling_matches_the_asymmetric_pcm_range() {
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(1.0), 32767);
        assert_eq!(sample_to_i16(-1.0), -32768);
        assert_eq!(sample_to_i16(2.0), 32767);
        assert_eq!(sample_to_i16(-2.0), -32768);
        assert_eq!(sample_to_i16(0.5), 16383);
        assert_eq!(sample_to_i16(-0.5), -16384);
    }

    #[test]
    fn one_second_mono_8khz_wav_has_the_documented_layout() {
        let samples = vec![0.0f32; 8000];
        let bytes = encode_wav(&samples, 1, 8000).unwrap();

        let data_bytes = 8000 * 2;
        assert_eq!(bytes.len(), 44 + data_bytes);

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), (data_bytes + 36) as u32);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16); // Subchunk1Size
        assert_eq!(u16_at(&bytes, 20), 1); // AudioFormat = PCM
        assert_eq!(u16_at(&bytes, 22), 1); // NumChannels
        assert_eq!(u32_at(&bytes, 24), 8000); // SampleRate
        assert_eq!(u32_at(&bytes, 28), 8000 * 1 * 2); // ByteRate
        assert_eq!(u16_at(&bytes, 32), 1 * 2); // BlockAlign
        assert_eq!(u16_at(&bytes, 34), 16); // BitsPerSample
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), data_bytes as u32);

        // All-zero samples stay zero.
        assert!(bytes[44..].iter().all(|&b| b == 0));
    }

    #[test]
    fn stereo_header_fields_follow_the_formula() {
        let bytes = encode_wav(&vec![0.0f32; 400], 2, 44100).unwrap();
        assert_eq!(u16_at(&bytes, 22), 2);
        assert_eq!(u32_at(&bytes, 28), 44100 * 2 * 2);
        assert_eq!(u16_at(&bytes, 32), 4);
        assert_eq!(u32_at(&bytes, 40), 400 * 2);
    }

    #[test]
    fn disabled_effects_render_the_source_unchanged() {
        let source = AudioSource::new(vec![0.5f32, -0.5, 0.25, -0.25], 8000, 1);
        let rendered = render_with_effects(&source, &EffectSettings::default(), 2);
        assert_eq!(rendered, source.samples);
    }

    #[test]
    fn enabled_chain_changes_the_rendered_audio() {
        let samples: Vec<f32> = (0..8000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 8000.0).sin())
            .collect();
        let source = AudioSource::new(samples.clone(), 8000, 1);

        let mut settings = EffectSettings::default();
        settings.toggle(EffectKind::Compression);
        settings.set_param(EffectKind::Compression, "threshold", -30.0);
        settings.set_param(EffectKind::Compression, "ratio", 20.0);

        let rendered = render_with_effects(&source, &settings, DEFAULT_BLOCK_FRAMES);
        assert_ne!(rendered, samples);
    }

    #[test]
    fn export_writes_a_complete_file_and_no_leftover_temp() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bounce.wav");
        let out = out.to_str().unwrap();

        let source = AudioSource::new(vec![0.0f32; 8000], 8000, 1);
        export_to_wav(&source, &EffectSettings::default(), out, DEFAULT_BLOCK_FRAMES).unwrap();

        let bytes = std::fs::read(out).unwrap();
        assert_eq!(bytes.len(), 44 + 8000 * 2);
        assert!(!Path::new(&format!("{out}.part")).exists());
    }

    #[test]
    fn default_export_path_appends_edited_suffix() {
        assert_eq!(default_export_path("song.mp3"), "song_edited.wav");
        assert!(default_export_path("/tmp/mix.ogg").ends_with("/tmp/mix_edited.wav"));
    }
}
