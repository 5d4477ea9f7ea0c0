// src/effects/mod.rs

pub mod compressor;
pub mod equalizer;
pub mod reverb;

use serde::{Deserialize, Serialize};

/// The three toggleable mastering effects, in chain-precedence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Eq,
    Compression,
    Reverb,
}

impl EffectKind {
    pub const ALL: [EffectKind; 3] = [EffectKind::Eq, EffectKind::Compression, EffectKind::Reverb];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Eq => "eq",
            EffectKind::Compression => "compression",
            EffectKind::Reverb => "reverb",
        }
    }
}

// Parameter clamp bounds. Out-of-range values are pulled to the boundary,
// never rejected.
pub const EQ_GAIN_DB: (f32, f32) = (-20.0, 20.0);
pub const COMP_THRESHOLD_DB: (f32, f32) = (-60.0, 0.0);
pub const COMP_RATIO: (f32, f32) = (1.0, 20.0);
pub const REVERB_DECAY_SECS: (f32, f32) = (0.1, 10.0);
pub const REVERB_WET: (f32, f32) = (0.0, 1.0);

fn clamp(value: f32, bounds: (f32, f32)) -> f32 {
    value.clamp(bounds.0, bounds.1)
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EqSettings {
    pub enabled: bool,
    pub low_db: f32,
    pub mid_db: f32,
    pub high_db: f32,
}

impl Default for EqSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            low_db: 0.0,
            mid_db: 0.0,
            high_db: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CompressionSettings {
    pub enabled: bool,
    pub threshold_db: f32,
    pub ratio: f32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_db: -20.0,
            ratio: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ReverbSettings {
    pub enabled: bool,
    pub decay_secs: f32,
    pub wet: f32,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            decay_secs: 2.0,
            wet: 0.3,
        }
    }
}

/// The effect registry: three named slots, independent of transport lifetime.
/// Parameters stick around while an effect is disabled, so re-enabling
/// resumes with the prior values.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct EffectSettings {
    pub eq: EqSettings,
    pub compression: CompressionSettings,
    pub reverb: ReverbSettings,
}

impl EffectSettings {
    pub fn enabled(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Eq => self.eq.enabled,
            EffectKind::Compression => self.compression.enabled,
            EffectKind::Reverb => self.reverb.enabled,
        }
    }

    /// Flip one effect's enabled flag. Returns the new state.
    pub fn toggle(&mut self, kind: EffectKind) -> bool {
        let flag = match kind {
            EffectKind::Eq => &mut self.eq.enabled,
            EffectKind::Compression => &mut self.compression.enabled,
            EffectKind::Reverb => &mut self.reverb.enabled,
        };
        *flag = !*flag;
        *flag
    }

    /// Overwrite one numeric parameter, clamped to its documented range.
    /// Returns false for an unknown (effect, param) pair; state is unchanged.
    pub fn set_param(&mut self, kind: EffectKind, param: &str, value: f32) -> bool {
        match (kind, param) {
            (EffectKind::Eq, "low") => self.eq.low_db = clamp(value, EQ_GAIN_DB),
            (EffectKind::Eq, "mid") => self.eq.mid_db = clamp(value, EQ_GAIN_DB),
            (EffectKind::Eq, "high") => self.eq.high_db = clamp(value, EQ_GAIN_DB),
            (EffectKind::Compression, "threshold") => {
                self.compression.threshold_db = clamp(value, COMP_THRESHOLD_DB)
            }
            (EffectKind::Compression, "ratio") => {
                self.compression.ratio = clamp(value, COMP_RATIO)
            }
            (EffectKind::Reverb, "decay") => {
                self.reverb.decay_secs = clamp(value, REVERB_DECAY_SECS)
            }
            (EffectKind::Reverb, "wet") => self.reverb.wet = clamp(value, REVERB_WET),
            _ => {
                log::warn!("unknown effect parameter {}/{}", kind.name(), param);
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_clamp_to_documented_ranges() {
        let mut s = EffectSettings::default();
        assert!(s.set_param(EffectKind::Eq, "low", 35.0));
        assert_eq!(s.eq.low_db, 20.0);
        assert!(s.set_param(EffectKind::Eq, "high", -99.0));
        assert_eq!(s.eq.high_db, -20.0);
        assert!(s.set_param(EffectKind::Compression, "threshold", 5.0));
        assert_eq!(s.compression.threshold_db, 0.0);
        assert!(s.set_param(EffectKind::Compression, "ratio", 0.5));
        assert_eq!(s.compression.ratio, 1.0);
        assert!(s.set_param(EffectKind::Reverb, "decay", 0.0));
        assert_eq!(s.reverb.decay_secs, 0.1);
        assert!(s.set_param(EffectKind::Reverb, "wet", 1.5));
        assert_eq!(s.reverb.wet, 1.0);
    }

    #[test]
    fn unknown_param_is_rejected_without_state_change() {
        let mut s = EffectSettings::default();
        let before = s;
        assert!(!s.set_param(EffectKind::Reverb, "sparkle", 1.0));
        assert_eq!(before.reverb.decay_secs, s.reverb.decay_secs);
        assert_eq!(before.reverb.wet, s.reverb.wet);
    }

    #[test]
    fn disabling_keeps_parameter_values() {
        let mut s = EffectSettings::default();
        s.set_param(EffectKind::Reverb, "wet", 0.9);
        assert!(s.toggle(EffectKind::Reverb));
        assert!(!s.toggle(EffectKind::Reverb));
        assert_eq!(s.reverb.wet, 0.9);
    }

    #[test]
    fn defaults_match_the_reference_surface() {
        let s = EffectSettings::default();
        assert!(!s.eq.enabled && !s.compression.enabled && !s.reverb.enabled);
        assert_eq!(s.compression.threshold_db, -20.0);
        assert_eq!(s.compression.ratio, 4.0);
        assert_eq!(s.reverb.decay_secs, 2.0);
        assert_eq!(s.reverb.wet, 0.3);
    }
}
