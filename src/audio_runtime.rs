// src/audio_runtime.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::Stream;

use crate::audio::setup_output_device;
use crate::decoder::{self, AudioSource};
use crate::effects::{EffectKind, EffectSettings};
use crate::engine::{Engine, PlaybackBuffer, Region};
use crate::error::EditorError;
use crate::session::{export, PresetManifest};

/// Owns the Engine + CPAL stream and exposes a simple control API. This is
/// the transport-driver boundary: every command locks the engine, so commands
/// and the output callback are strictly serialized.
pub struct AudioRuntime {
    engine: Arc<Mutex<Engine>>,
    sample_rate: u32,
    /// Bumped at the start of every load; a decode that finishes after a
    /// newer load has started is stale and gets dropped.
    load_serial: AtomicU64,
    export_block_frames: usize,
    _stream: Stream,
}

impl AudioRuntime {
    /// Create engine + output stream.
    pub fn new() -> Result<Self, EditorError> {
        let output = setup_output_device()?;
        let sample_rate = output.output_sample_rate;
        let device_channels = output.output_channels;

        let engine = Arc::new(Mutex::new(Engine::new(sample_rate)));

        // Build the CPAL stream that pulls from Engine::render.
        let device = output.device;
        let config = output.config;
        let err_fn = |err| log::error!("audio output stream error: {err}");
        let engine_cb = engine.clone();

        let mut scratch_buffer: Vec<f32> = Vec::with_capacity(1024);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _| {
                    if let Ok(mut eng) = engine_cb.lock() {
                        let frames = data.len() / device_channels;
                        if scratch_buffer.len() != frames * 2 {
                            scratch_buffer.resize(frames * 2, 0.0);
                        }

                        // Engine always renders stereo; map onto whatever
                        // the device actually has.
                        eng.render(&mut scratch_buffer);

                        let mut scratch_idx = 0;
                        for frame in data.chunks_mut(device_channels) {
                            let l = scratch_buffer[scratch_idx];
                            let r = scratch_buffer[scratch_idx + 1];

                            match frame.len() {
                                0 => {}
                                1 => frame[0] = 0.5 * (l + r),
                                _ => {
                                    frame[0] = l;
                                    frame[1] = r;
                                    for sample in frame.iter_mut().skip(2) {
                                        *sample = 0.0;
                                    }
                                }
                            }

                            scratch_idx += 2;
                        }
                    } else {
                        data.fill(0.0);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| EditorError::DriverCommand(e.to_string()))?;

        stream
            .play()
            .map_err(|e| EditorError::DriverCommand(e.to_string()))?;

        Ok(Self {
            engine,
            sample_rate,
            load_serial: AtomicU64::new(0),
            export_block_frames: export::DEFAULT_BLOCK_FRAMES,
            _stream: stream,
        })
    }

    // --- SOURCE ---

    /// Decode + resample a file and install it as the active source. The
    /// slow work runs outside the engine lock; if a newer load supersedes
    /// this one while it decodes, the result is discarded. A failed decode
    /// leaves the prior source and all state untouched.
    pub fn load_track(&self, path: &str) -> Result<(), EditorError> {
        let serial = self.load_serial.fetch_add(1, Ordering::SeqCst) + 1;

        let source = decoder::decode_file(path)?;
        let playback = PlaybackBuffer::from_source(&source, self.sample_rate)?;

        if self.load_serial.load(Ordering::SeqCst) != serial {
            log::info!("discarding stale decode of {path}");
            return Ok(());
        }

        if let Ok(mut eng) = self.engine.lock() {
            eng.set_source(Arc::new(source), playback);
        }
        Ok(())
    }

    pub fn clear_track(&self) {
        self.load_serial.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut eng) = self.engine.lock() {
            eng.clear_source();
        }
    }

    pub fn source(&self) -> Option<Arc<AudioSource>> {
        match self.engine.lock() {
            Ok(eng) => eng.source(),
            Err(_) => None,
        }
    }

    pub fn has_source(&self) -> bool {
        self.engine.lock().map(|e| e.has_source()).unwrap_or(false)
    }

    // --- TRANSPORT ---

    pub fn toggle_play(&self) {
        if let Ok(mut eng) = self.engine.lock() {
            eng.toggle_playback();
        } else {
            log::warn!("toggle_play: engine lock unavailable, command dropped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.engine.lock().map(|e| e.is_playing()).unwrap_or(false)
    }

    pub fn position_secs(&self) -> f64 {
        self.engine.lock().map(|e| e.position_secs()).unwrap_or(0.0)
    }

    pub fn duration_secs(&self) -> f64 {
        self.engine.lock().map(|e| e.duration_secs()).unwrap_or(0.0)
    }

    pub fn seek_to(&self, secs: f64) {
        if let Ok(mut eng) = self.engine.lock() {
            eng.seek_to(secs);
        }
    }

    pub fn seek_by(&self, delta_secs: f64) {
        if let Ok(mut eng) = self.engine.lock() {
            let target = eng.position_secs() + delta_secs;
            eng.seek_to(target);
        }
    }

    pub fn set_volume(&self, volume: f32) {
        if let Ok(mut eng) = self.engine.lock() {
            eng.set_volume(volume);
        }
    }

    pub fn volume(&self) -> f32 {
        self.engine.lock().map(|e| e.volume()).unwrap_or(1.0)
    }

    // --- REGION / ZOOM ---

    pub fn set_region(&self, start: f64, end: f64) -> bool {
        match self.engine.lock() {
            Ok(mut eng) => eng.set_region(Some((start, end))),
            Err(_) => false,
        }
    }

    pub fn clear_region(&self) {
        if let Ok(mut eng) = self.engine.lock() {
            eng.set_region(None);
        }
    }

    pub fn region(&self) -> Option<Region> {
        self.engine.lock().map(|e| e.region()).unwrap_or(None)
    }

    pub fn set_zoom(&self, zoom: f32) {
        if let Ok(mut eng) = self.engine.lock() {
            eng.set_zoom(zoom);
        }
    }

    pub fn zoom(&self) -> f32 {
        self.engine.lock().map(|e| e.zoom()).unwrap_or(1.0)
    }

    // --- EFFECTS ---

    pub fn toggle_effect(&self, kind: EffectKind) -> bool {
        match self.engine.lock() {
            Ok(mut eng) => eng.toggle_effect(kind),
            Err(_) => false,
        }
    }

    pub fn set_effect_param(&self, kind: EffectKind, param: &str, value: f32) -> bool {
        match self.engine.lock() {
            Ok(mut eng) => eng.set_effect_param(kind, param, value),
            Err(_) => false,
        }
    }

    pub fn effect_settings(&self) -> EffectSettings {
        self.engine
            .lock()
            .map(|e| e.settings())
            .unwrap_or_default()
    }

    // --- PRESETS ---

    pub fn preset_snapshot(&self) -> Option<PresetManifest> {
        let eng = self.engine.lock().ok()?;
        Some(PresetManifest::new(eng.volume(), eng.zoom(), eng.settings()))
    }

    pub fn apply_preset(&self, preset: &PresetManifest) {
        if let Ok(mut eng) = self.engine.lock() {
            eng.set_volume(preset.volume);
            eng.set_zoom(preset.zoom);
            eng.set_settings(preset.effects);
        }
    }

    // --- EXPORT ---

    /// Bounce the current source through the current effect settings to a
    /// PCM16 WAV. The render happens on a fresh offline chain outside the
    /// engine lock, so playback keeps running undisturbed.
    pub fn export(&self, output_path: &str) -> Result<(), EditorError> {
        let (source, settings) = {
            let eng = self
                .engine
                .lock()
                .map_err(|_| EditorError::Export("engine lock unavailable".into()))?;
            let source = eng
                .source()
                .ok_or_else(|| EditorError::Export("no source loaded".into()))?;
            (source, eng.settings())
        };

        export::export_to_wav(&source, &settings, output_path, self.export_block_frames)
    }
}
