// src/engine/mod.rs

pub mod region;

pub use region::Region;

use std::sync::Arc;

use crate::decoder::{dsp, resample, AudioSource};
use crate::effects::{EffectKind, EffectSettings};
use crate::error::EditorError;
use crate::router::EffectRack;

/// Engine-rate playback material: the decoded source up/down-mixed to stereo
/// and resampled to the output device rate once, at load time.
pub struct PlaybackBuffer {
    samples: Vec<f32>,
}

impl PlaybackBuffer {
    pub fn from_source(source: &AudioSource, engine_rate: u32) -> Result<Self, EditorError> {
        let stereo = dsp::updown_mix_interleaved(&source.samples, source.channels, 2);
        let samples = resample::resample_interleaved(&stereo, 2, source.sample_rate, engine_rate)?;
        Ok(Self { samples })
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Transport {
    pub position_frames: usize,
    pub playing: bool,
    pub volume: f32,
}

/// Single authoritative owner of transport, region, zoom and effect state.
/// Every command and the output callback go through the same lock around
/// this struct, so no two playback commands are ever in flight at once.
pub struct Engine {
    pub sample_rate: u32,
    pub channels: usize,
    pub transport: Transport,
    region: Option<Region>,
    /// Armed by region-bounded playback; any superseding command clears it
    /// so a stale stop can never fire against a newer playback session.
    region_stop_frame: Option<usize>,
    zoom: f32,
    source: Option<Arc<AudioSource>>,
    playback: Option<PlaybackBuffer>,
    settings: EffectSettings,
    rack: EffectRack,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        let channels = 2;
        let settings = EffectSettings::default();
        let mut rack = EffectRack::new(sample_rate, channels);
        rack.sync_params(&settings);
        rack.rebuild(&settings);
        Self {
            sample_rate,
            channels,
            transport: Transport {
                position_frames: 0,
                playing: false,
                volume: 0.7,
            },
            region: None,
            region_stop_frame: None,
            zoom: 1.0,
            source: None,
            playback: None,
            settings,
            rack,
        }
    }

    // --- SOURCE LIFECYCLE ---

    /// Install a freshly decoded source. Position, play state and region
    /// reset; volume, zoom and effect settings deliberately survive.
    pub fn set_source(&mut self, source: Arc<AudioSource>, playback: PlaybackBuffer) {
        self.source = Some(source);
        self.playback = Some(playback);
        self.transport.position_frames = 0;
        self.transport.playing = false;
        self.region = None;
        self.region_stop_frame = None;
        self.rack.reset_state();
    }

    /// Drop the active source. Safe to call repeatedly and on a state that
    /// never finished loading.
    pub fn clear_source(&mut self) {
        self.source = None;
        self.playback = None;
        self.transport.position_frames = 0;
        self.transport.playing = false;
        self.region = None;
        self.region_stop_frame = None;
        self.rack.reset_state();
    }

    pub fn has_source(&self) -> bool {
        self.playback.is_some()
    }

    pub fn source(&self) -> Option<Arc<AudioSource>> {
        self.source.clone()
    }

    pub fn duration_secs(&self) -> f64 {
        match &self.playback {
            Some(pb) => pb.frames() as f64 / self.sample_rate as f64,
            None => 0.0,
        }
    }

    // --- TRANSPORT ---

    pub fn position_secs(&self) -> f64 {
        self.transport.position_frames as f64 / self.sample_rate as f64
    }

    pub fn is_playing(&self) -> bool {
        self.transport.playing
    }

    /// Play/pause. With an active region, playback starts at the region
    /// start with an automatic stop armed at the region end.
    pub fn toggle_playback(&mut self) {
        if self.playback.is_none() {
            return;
        }
        if self.transport.playing {
            self.transport.playing = false;
            self.region_stop_frame = None;
        } else {
            if let Some(region) = self.region {
                self.transport.position_frames = self.frame_at(region.start);
                self.region_stop_frame = Some(self.frame_at(region.end));
            }
            self.transport.playing = true;
        }
    }

    /// Reposition, clamped to the track. While playing this is an atomic
    /// restart from the new time; while paused only the position moves.
    /// Either way it supersedes a scheduled region stop.
    pub fn seek_to(&mut self, secs: f64) {
        if self.playback.is_none() {
            return;
        }
        let clamped = secs.clamp(0.0, self.duration_secs());
        self.transport.position_frames = self.frame_at(clamped);
        self.region_stop_frame = None;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.transport.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.transport.volume
    }

    // --- REGION ---

    /// Set or clear the selected region. Malformed bounds are rejected with
    /// no state change (returns false). A successful call cancels any
    /// pending auto-stop.
    pub fn set_region(&mut self, bounds: Option<(f64, f64)>) -> bool {
        match bounds {
            None => {
                self.region = None;
                self.region_stop_frame = None;
                true
            }
            Some((start, end)) => match Region::validated(start, end, self.duration_secs()) {
                Some(region) => {
                    self.region = Some(region);
                    self.region_stop_frame = None;
                    true
                }
                None => {
                    log::warn!("rejected region [{start:.3}, {end:.3}]");
                    false
                }
            },
        }
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    // --- ZOOM ---

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(1.0, 50.0);
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    // --- EFFECTS ---

    /// Flip one effect and rebuild the signal chain before the next rendered
    /// buffer. Returns the new enabled state.
    pub fn toggle_effect(&mut self, kind: EffectKind) -> bool {
        let state = self.settings.toggle(kind);
        self.rack.sync_params(&self.settings);
        self.rack.rebuild(&self.settings);
        state
    }

    /// Update one effect parameter and push it into the live node. The
    /// topology is unchanged, so no re-route happens.
    pub fn set_effect_param(&mut self, kind: EffectKind, param: &str, value: f32) -> bool {
        if !self.settings.set_param(kind, param, value) {
            return false;
        }
        self.rack.sync_params(&self.settings);
        true
    }

    pub fn settings(&self) -> EffectSettings {
        self.settings
    }

    /// Replace the whole registry (preset load) and re-route.
    pub fn set_settings(&mut self, settings: EffectSettings) {
        self.settings = settings;
        self.rack.sync_params(&self.settings);
        self.rack.rebuild(&self.settings);
    }

    pub fn active_chain(&self) -> Vec<EffectKind> {
        self.rack.active_chain().to_vec()
    }

    // --- RENDER ---

    /// Pull one interleaved stereo block. Handles the region auto-stop and
    /// the end-of-track policy (stop and rewind to zero) sample-accurately.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        if !self.transport.playing {
            return;
        }

        let channels = self.channels;
        let (written, limit) = {
            let Some(pb) = &self.playback else {
                return;
            };
            let total = pb.frames();
            let limit = self.region_stop_frame.map_or(total, |f| f.min(total));
            let pos = self.transport.position_frames.min(total);
            let frames = out.len() / channels;
            let n = frames.min(limit.saturating_sub(pos));
            if n > 0 {
                out[..n * channels]
                    .copy_from_slice(&pb.samples[pos * channels..(pos + n) * channels]);
            }
            (n, limit)
        };

        if written > 0 {
            let span = &mut out[..written * channels];
            self.rack.process(span);
            let volume = self.transport.volume;
            for sample in span.iter_mut() {
                *sample *= volume;
            }
        }

        self.transport.position_frames += written;

        if self.transport.position_frames >= limit {
            if self.region_stop_frame.take().is_some() {
                // Region playback halts at the region end.
                self.transport.playing = false;
                self.transport.position_frames = limit;
            } else {
                // End of track: stop and rewind.
                self.transport.playing = false;
                self.transport.position_frames = 0;
            }
        }
    }

    fn frame_at(&self, secs: f64) -> usize {
        let frame = (secs * self.sample_rate as f64).round() as usize;
        match &self.playback {
            Some(pb) => frame.min(pb.frames()),
            None => 0,
        }
    }
}
