// src/effects/reverb.rs

use freeverb::Freeverb;

use crate::effects::{ReverbSettings, REVERB_DECAY_SECS};

/// Freeverb-backed reverb node. Freeverb has no literal decay-time control;
/// the decay parameter maps monotonically onto room size, which governs how
/// long the tail rings.
pub struct ReverbNode {
    verb: Freeverb,
    sample_rate: u32,
    wet: f32,
    decay_secs: f32,
}

impl ReverbNode {
    pub fn new(sample_rate: u32) -> Self {
        let mut verb = Freeverb::new(sample_rate as usize);
        // The node blends dry/wet itself, so the inner verb runs fully wet.
        verb.set_wet(1.0);
        verb.set_dry(0.0);
        verb.set_dampening(0.5);
        verb.set_width(0.9);
        let mut node = Self {
            verb,
            sample_rate,
            wet: 0.3,
            decay_secs: 2.0,
        };
        node.set_decay(2.0);
        node
    }

    fn set_decay(&mut self, decay_secs: f32) {
        self.decay_secs = decay_secs;
        let (lo, hi) = REVERB_DECAY_SECS;
        let norm = ((decay_secs - lo) / (hi - lo)).clamp(0.0, 1.0);
        self.verb.set_room_size(0.2 + 0.78 * norm as f64);
    }

    pub fn apply(&mut self, settings: &ReverbSettings) {
        if (settings.decay_secs - self.decay_secs).abs() > f32::EPSILON {
            self.set_decay(settings.decay_secs);
        }
        self.wet = settings.wet;
    }

    pub fn reset_state(&mut self) {
        // Freeverb keeps its tail in internal comb/allpass lines; rebuilding
        // the room at the same size flushes them.
        let decay = self.decay_secs;
        self.verb = Freeverb::new(self.sample_rate as usize);
        self.verb.set_wet(1.0);
        self.verb.set_dry(0.0);
        self.verb.set_dampening(0.5);
        self.verb.set_width(0.9);
        self.set_decay(decay);
    }

    /// Processes interleaved samples in place. Mono buffers are fed as
    /// dual-mono and collapsed back.
    pub fn process(&mut self, buffer: &mut [f32], channels: usize) {
        let wet = self.wet as f64;
        let dry = 1.0 - wet;
        match channels {
            1 => {
                for s in buffer.iter_mut() {
                    let d = *s as f64;
                    let (wl, wr) = self.verb.tick((d, d));
                    *s = (d * dry + 0.5 * (wl + wr) * wet) as f32;
                }
            }
            _ => {
                for frame in buffer.chunks_mut(channels) {
                    let l = frame[0] as f64;
                    let r = frame[1] as f64;
                    let (wl, wr) = self.verb.tick((l, r));
                    frame[0] = (l * dry + wl * wet) as f32;
                    frame[1] = (r * dry + wr * wet) as f32;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_wet_passes_the_dry_signal() {
        let mut verb = ReverbNode::new(44100);
        verb.apply(&ReverbSettings {
            enabled: true,
            decay_secs: 2.0,
            wet: 0.0,
        });
        let mut buf: Vec<f32> = (0..512).map(|i| ((i % 7) as f32 - 3.0) * 0.1).collect();
        let reference = buf.clone();
        verb.process(&mut buf, 1);
        for (got, want) in buf.iter().zip(reference.iter()) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn wet_impulse_leaves_a_tail() {
        let mut verb = ReverbNode::new(44100);
        verb.apply(&ReverbSettings {
            enabled: true,
            decay_secs: 4.0,
            wet: 1.0,
        });
        let mut buf = vec![0.0f32; 44100];
        buf[0] = 1.0;
        buf[1] = 1.0;
        verb.process(&mut buf, 2);
        let tail_energy: f32 = buf[22050..].iter().map(|s| s * s).sum();
        assert!(tail_energy > 0.0, "expected a reverb tail");
    }
}
