// src/session/mod.rs

pub mod export;

use std::fs::File;
use std::io::{BufReader, BufWriter};

use serde::{Deserialize, Serialize};

use crate::effects::EffectSettings;
use crate::error::EditorError;

/// Everything worth keeping between sessions: mix volume, zoom and the full
/// effect registry. Transport position and region are per-session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetManifest {
    pub version: u32,
    pub volume: f32,
    pub zoom: f32,
    pub effects: EffectSettings,
}

impl PresetManifest {
    pub fn new(volume: f32, zoom: f32, effects: EffectSettings) -> Self {
        Self {
            version: 1,
            volume,
            zoom,
            effects,
        }
    }

    pub fn save_to_disk(&self, path: &str) -> Result<(), EditorError> {
        let file = File::create(path).map_err(|e| EditorError::Manifest(e.to_string()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| EditorError::Manifest(e.to_string()))
    }

    pub fn load_from_disk(path: &str) -> Result<Self, EditorError> {
        let file = File::open(path).map_err(|e| EditorError::Manifest(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| EditorError::Manifest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;

    #[test]
    fn preset_round_trips_through_disk() {
        let mut effects = EffectSettings::default();
        effects.toggle(EffectKind::Eq);
        effects.set_param(EffectKind::Eq, "low", 6.0);
        effects.set_param(EffectKind::Reverb, "wet", 0.55);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        let path = path.to_str().unwrap();

        PresetManifest::new(0.8, 4.0, effects).save_to_disk(path).unwrap();
        let loaded = PresetManifest::load_from_disk(path).unwrap();

        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.volume, 0.8);
        assert_eq!(loaded.zoom, 4.0);
        assert!(loaded.effects.eq.enabled);
        assert_eq!(loaded.effects.eq.low_db, 6.0);
        assert_eq!(loaded.effects.reverb.wet, 0.55);
        assert!(!loaded.effects.reverb.enabled);
    }

    #[test]
    fn missing_preset_is_a_manifest_error() {
        assert!(matches!(
            PresetManifest::load_from_disk("nowhere/preset.json"),
            Err(EditorError::Manifest(_))
        ));
    }
}
