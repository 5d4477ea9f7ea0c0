// src/decoder/mod.rs

pub mod dsp;
pub mod resample;

use std::fs::File;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::default::{get_codecs, get_probe};

use crate::error::EditorError;

/// A fully decoded audio asset: interleaved f32 samples at the source rate.
/// Exactly one source is active at a time; the engine owns the current one.
#[derive(Debug, Clone)]
pub struct AudioSource {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl AudioSource {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: usize) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode a whole file into memory. Acceptance is decoder-dependent: anything
/// symphonia can probe (wav/mp3/ogg/m4a/...) goes; everything else comes back
/// as a `Decode` error and the caller keeps its previous source.
pub fn decode_file(path: &str) -> Result<AudioSource, EditorError> {
    let file = File::open(path).map_err(|e| EditorError::Decode(format!("{path}: {e}")))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let probed = get_probe()
        .format(
            &Default::default(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EditorError::Decode(format!("{path}: {e}")))?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| EditorError::Decode(format!("{path}: no default audio track")))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| EditorError::Decode(format!("{path}: {e}")))?;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut out = Vec::<f32>::new();

    let mut sample_rate = 44100;
    let mut channels = 2;
    let mut format_locked = false;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(_) => continue,
        };

        let spec = decoded.spec();
        let current_channels = spec.channels.count();
        let current_rate = spec.rate;

        // Lock format on the first valid packet.
        if !format_locked {
            if decoded.frames() > 0 {
                sample_rate = current_rate;
                channels = current_channels;
                format_locked = true;
                log::debug!("decoder locked format: {} Hz / {} ch", sample_rate, channels);
            } else {
                continue;
            }
        }

        if sample_buf.is_none() || sample_buf.as_ref().unwrap().capacity() < decoded.capacity() {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, *spec));
        }
        let buf = sample_buf.as_mut().unwrap();
        buf.copy_interleaved_ref(decoded);
        let new_samples = buf.samples();

        // Stray packets with a different channel layout get mapped onto the
        // locked layout instead of corrupting the interleaving.
        if current_channels == channels {
            out.extend_from_slice(new_samples);
        } else {
            out.extend_from_slice(&dsp::updown_mix_interleaved(
                new_samples,
                current_channels,
                channels,
            ));
        }
    }

    if !format_locked || out.is_empty() {
        return Err(EditorError::Decode(format!("{path}: no decodable audio")));
    }

    log::info!(
        "decoded {}: {} frames, {} Hz, {} ch",
        path,
        out.len() / channels,
        sample_rate,
        channels
    );
    Ok(AudioSource::new(out, sample_rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_duration_follows_frames() {
        let src = AudioSource::new(vec![0.0; 8000 * 2], 8000, 2);
        assert_eq!(src.frames(), 8000);
        assert!((src.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unreadable_path_is_a_decode_failure() {
        let err = decode_file("no/such/file.wav").unwrap_err();
        assert!(matches!(err, EditorError::Decode(_)));
    }

    #[test]
    fn garbage_bytes_are_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is not audio at all").unwrap();
        let err = decode_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, EditorError::Decode(_)));
    }
}
