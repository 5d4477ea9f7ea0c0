// src/config.rs

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// Tunables shared by both surfaces. Loaded from `wavedit.json` when present,
/// otherwise defaults apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// UI tick in milliseconds. While playing, each tick pulls the driver
    /// position into the displayed state (polling, not push).
    pub ui_tick_ms: u64,
    /// Base column count of the terminal waveform view (buckets = columns * zoom).
    pub waveform_columns: usize,
    /// Block size (frames) for the offline export render loop.
    pub export_block_frames: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            ui_tick_ms: 16,
            waveform_columns: 120,
            export_block_frames: 1024,
        }
    }
}

impl EditorConfig {
    pub fn load_from_disk(path: &str) -> Result<Self, EditorError> {
        let file = File::open(path).map_err(|e| EditorError::Manifest(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| EditorError::Manifest(e.to_string()))
    }

    /// Missing file is fine (defaults); a present-but-broken file is an error
    /// so a typo in the config doesn't silently vanish.
    pub fn load_or_default(path: &str) -> Result<Self, EditorError> {
        if Path::new(path).exists() {
            Self::load_from_disk(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = EditorConfig::load_or_default("definitely/not/here.json").unwrap();
        assert_eq!(cfg.ui_tick_ms, 16);
        assert_eq!(cfg.waveform_columns, 120);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wavedit.json");
        let mut f = File::create(&path).unwrap();
        write!(f, "{{ \"ui_tick_ms\": 33 }}").unwrap();

        let cfg = EditorConfig::load_from_disk(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.ui_tick_ms, 33);
        assert_eq!(cfg.export_block_frames, 1024);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wavedit.json");
        let mut f = File::create(&path).unwrap();
        write!(f, "not json").unwrap();

        assert!(EditorConfig::load_or_default(path.to_str().unwrap()).is_err());
    }
}
