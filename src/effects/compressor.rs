// src/effects/compressor.rs

use crate::effects::CompressionSettings;

const ATTACK_MS: f32 = 5.0;
const RELEASE_MS: f32 = 50.0;

/// Envelope-follower compressor. Threshold and ratio come from the registry;
/// attack/release are fixed program values. All mutation happens under the
/// engine lock, so plain fields suffice.
pub struct CompressorNode {
    threshold_db: f32,
    ratio: f32,
    sample_rate: f32,
    envelope: f32,
}

impl CompressorNode {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            threshold_db: -20.0,
            ratio: 4.0,
            sample_rate,
            envelope: 0.0,
        }
    }

    pub fn apply(&mut self, settings: &CompressionSettings) {
        self.threshold_db = settings.threshold_db;
        self.ratio = settings.ratio.max(1.0);
    }

    pub fn reset_state(&mut self) {
        self.envelope = 0.0;
    }

    /// Processes a chunk of interleaved samples in place. No locks, no
    /// allocations.
    pub fn process(&mut self, buffer: &mut [f32]) {
        let attack_coef = (-1.0 / (ATTACK_MS * 0.001 * self.sample_rate)).exp();
        let release_coef = (-1.0 / (RELEASE_MS * 0.001 * self.sample_rate)).exp();

        for sample in buffer.iter_mut() {
            // Peak detection
            let input_level = sample.abs();

            // Envelope follower
            if input_level > self.envelope {
                self.envelope = attack_coef * (self.envelope - input_level) + input_level;
            } else {
                self.envelope = release_coef * (self.envelope - input_level) + input_level;
            }

            let env_db = 20.0 * self.envelope.max(1e-5).log10();

            // Gain reduction above threshold
            let mut gain_reduction_db = 0.0;
            if env_db > self.threshold_db {
                let overshoot = env_db - self.threshold_db;
                gain_reduction_db = overshoot * (1.0 - (1.0 / self.ratio));
            }

            let gain_reduction_linear = 10.0_f32.powf(-gain_reduction_db / 20.0);
            *sample *= gain_reduction_linear;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_signal_below_threshold_is_untouched() {
        let mut comp = CompressorNode::new(44100.0);
        comp.apply(&CompressionSettings {
            enabled: true,
            threshold_db: -6.0,
            ratio: 8.0,
        });

        // -40 dBFS, far under a -6 dB threshold.
        let mut buf = vec![0.01f32; 1024];
        comp.process(&mut buf);
        for s in &buf {
            assert!((s - 0.01).abs() < 1e-4);
        }
    }

    #[test]
    fn loud_signal_above_threshold_is_reduced() {
        let mut comp = CompressorNode::new(44100.0);
        comp.apply(&CompressionSettings {
            enabled: true,
            threshold_db: -20.0,
            ratio: 10.0,
        });

        // 0 dBFS square-ish signal, 20 dB over the threshold.
        let mut buf = vec![1.0f32; 8192];
        comp.process(&mut buf);
        let tail_peak = buf[4096..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(tail_peak < 0.5, "expected gain reduction, got peak {tail_peak}");
    }

    #[test]
    fn reset_clears_the_envelope() {
        let mut comp = CompressorNode::new(44100.0);
        comp.apply(&CompressionSettings {
            enabled: true,
            threshold_db: -30.0,
            ratio: 20.0,
        });
        let mut loud = vec![1.0f32; 4096];
        comp.process(&mut loud);
        comp.reset_state();
        assert_eq!(comp.envelope, 0.0);
    }
}
