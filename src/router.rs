// src/router.rs

use crate::effects::compressor::CompressorNode;
use crate::effects::equalizer::ThreeBandEq;
use crate::effects::reverb::ReverbNode;
use crate::effects::{EffectKind, EffectSettings};

/// Fixed chain precedence: EQ, then compression, then reverb, then out.
pub const CHAIN_ORDER: [EffectKind; 3] = [
    EffectKind::Eq,
    EffectKind::Compression,
    EffectKind::Reverb,
];

/// Computes the active chain for a settings snapshot: exactly the enabled
/// effects, in `CHAIN_ORDER`. Pure function of the snapshot, so the topology
/// never depends on the order the user reached it by.
pub fn chain_for(settings: &EffectSettings) -> Vec<EffectKind> {
    CHAIN_ORDER
        .iter()
        .copied()
        .filter(|kind| settings.enabled(*kind))
        .collect()
}

/// Owns the three processing node handles and the wiring between them.
/// Disabled nodes are bypassed entirely: they are absent from the active
/// chain, so they add no latency or coloration.
pub struct EffectRack {
    eq: ThreeBandEq,
    compressor: CompressorNode,
    reverb: ReverbNode,
    channels: usize,
    active: Vec<EffectKind>,
}

impl EffectRack {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        Self {
            eq: ThreeBandEq::new(sample_rate, channels),
            compressor: CompressorNode::new(sample_rate as f32),
            reverb: ReverbNode::new(sample_rate),
            channels,
            active: Vec::new(),
        }
    }

    /// Tear down the previous topology and rebuild it from scratch off the
    /// settings snapshot. No incremental patching: that is what keeps stale
    /// or duplicate links impossible.
    pub fn rebuild(&mut self, settings: &EffectSettings) {
        self.active = chain_for(settings);
        log::debug!("signal chain rebuilt: {:?}", self.active);
    }

    /// Push current parameter values into the live nodes. Topology is
    /// untouched; called on parameter updates so changes are audible on the
    /// next buffer.
    pub fn sync_params(&mut self, settings: &EffectSettings) {
        self.eq.apply(&settings.eq);
        self.compressor.apply(&settings.compression);
        self.reverb.apply(&settings.reverb);
    }

    /// Clear accumulated DSP state (filter memories, reverb tail). Used when
    /// the source is replaced so old material cannot ring into the new one.
    pub fn reset_state(&mut self) {
        self.eq.reset_state();
        self.compressor.reset_state();
        self.reverb.reset_state();
    }

    pub fn active_chain(&self) -> &[EffectKind] {
        &self.active
    }

    /// Run one interleaved block through the active chain, in order.
    pub fn process(&mut self, buffer: &mut [f32]) {
        for kind in &self.active {
            match kind {
                EffectKind::Eq => self.eq.process_buffer(buffer, self.channels),
                EffectKind::Compression => self.compressor.process(buffer),
                EffectKind::Reverb => self.reverb.process(buffer, self.channels),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(eq: bool, compression: bool, reverb: bool) -> EffectSettings {
        let mut s = EffectSettings::default();
        s.eq.enabled = eq;
        s.compression.enabled = compression;
        s.reverb.enabled = reverb;
        s
    }

    fn expected_chain(eq: bool, compression: bool, reverb: bool) -> Vec<EffectKind> {
        let mut v = Vec::new();
        if eq {
            v.push(EffectKind::Eq);
        }
        if compression {
            v.push(EffectKind::Compression);
        }
        if reverb {
            v.push(EffectKind::Reverb);
        }
        v
    }

    #[test]
    fn all_eight_subsets_connect_in_fixed_order() {
        for bits in 0u8..8 {
            let (eq, comp, rev) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            let chain = chain_for(&settings(eq, comp, rev));
            assert_eq!(chain, expected_chain(eq, comp, rev), "subset {bits:03b}");
        }
    }

    #[test]
    fn rebuild_is_independent_of_toggle_history() {
        // Reach every subset from every other subset; the resulting topology
        // must only depend on the destination snapshot.
        let mut rack = EffectRack::new(44100, 2);
        for from in 0u8..8 {
            for to in 0u8..8 {
                let prior = settings(from & 1 != 0, from & 2 != 0, from & 4 != 0);
                rack.rebuild(&prior);

                let target = settings(to & 1 != 0, to & 2 != 0, to & 4 != 0);
                rack.rebuild(&target);
                assert_eq!(
                    rack.active_chain(),
                    expected_chain(to & 1 != 0, to & 2 != 0, to & 4 != 0),
                    "transition {from:03b} -> {to:03b}"
                );
            }
        }
    }

    #[test]
    fn empty_chain_leaves_audio_untouched() {
        let mut rack = EffectRack::new(44100, 2);
        rack.rebuild(&EffectSettings::default());
        let mut buf: Vec<f32> = (0..64).map(|i| (i as f32) / 64.0).collect();
        let reference = buf.clone();
        rack.process(&mut buf);
        assert_eq!(buf, reference);
    }
}
