// src/waveform/mod.rs

use crate::decoder::AudioSource;

/// Peak-envelope downsampling for display: partition the frames into
/// `buckets` equal-width slices and keep the maximum absolute amplitude per
/// slice, across all channels. One-way, lossy, deterministic.
pub fn peak_envelope(samples: &[f32], channels: usize, buckets: usize) -> Vec<f32> {
    if buckets == 0 || channels == 0 {
        return Vec::new();
    }
    let frames = samples.len() / channels;
    if frames == 0 {
        return vec![0.0; buckets];
    }

    let mut peaks = Vec::with_capacity(buckets);
    for b in 0..buckets {
        let start = b * frames / buckets;
        let end = ((b + 1) * frames / buckets).max(start + 1).min(frames);
        let mut peak = 0.0f32;
        for frame in start..end {
            for ch in 0..channels {
                let s = samples[frame * channels + ch].abs();
                if s > peak {
                    peak = s;
                }
            }
        }
        peaks.push(peak);
    }
    peaks
}

/// A summarized view of one source at one zoom level.
pub struct Waveform {
    pub peaks: Vec<f32>,
    pub duration_secs: f64,
}

impl Waveform {
    /// Bucket count is the visual width scaled by zoom; zoom affects the
    /// summary resolution only, never the audio.
    pub fn build(source: &AudioSource, columns: usize, zoom: f32) -> Self {
        let buckets = ((columns as f32) * zoom.max(1.0)).round() as usize;
        Self {
            peaks: peak_envelope(&source.samples, source.channels, buckets),
            duration_secs: source.duration_secs(),
        }
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_samples_into_ten_buckets_takes_slice_peaks() {
        // Bucket i covers samples [10i, 10i+10); plant a known peak in each.
        let mut samples = vec![0.0f32; 100];
        for b in 0..10 {
            samples[b * 10 + 3] = -((b + 1) as f32) * 0.05;
        }
        let peaks = peak_envelope(&samples, 1, 10);
        assert_eq!(peaks.len(), 10);
        for (b, peak) in peaks.iter().enumerate() {
            let want = (b + 1) as f32 * 0.05;
            assert!((peak - want).abs() < 1e-6, "bucket {b}: {peak} != {want}");
        }
    }

    #[test]
    fn same_input_same_buckets_same_output() {
        let samples: Vec<f32> = (0..1000).map(|i| ((i * 37) % 100) as f32 / 100.0).collect();
        let a = peak_envelope(&samples, 2, 64);
        let b = peak_envelope(&samples, 2, 64);
        assert_eq!(a, b);
    }

    #[test]
    fn stereo_takes_the_louder_channel() {
        let samples = vec![0.1f32, -0.9, 0.2, 0.0];
        let peaks = peak_envelope(&samples, 2, 1);
        assert_eq!(peaks, vec![0.9]);
    }

    #[test]
    fn zoom_scales_the_bucket_count() {
        let source = AudioSource::new(vec![0.5f32; 48_000], 48_000, 1);
        let wf = Waveform::build(&source, 100, 4.0);
        assert_eq!(wf.len(), 400);
        assert!((wf.duration_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_yields_silent_buckets() {
        let peaks = peak_envelope(&[], 2, 8);
        assert_eq!(peaks, vec![0.0; 8]);
    }
}
