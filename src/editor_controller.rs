// src/editor_controller.rs

use std::fmt::Write as FmtWrite;
use std::io::{stdout, Write};

use crossterm::event::KeyCode;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate},
};

use crate::config::EditorConfig;
use crate::effects::EffectKind;
use crate::session::{export, PresetManifest};
use crate::waveform::Waveform;
use crate::AudioRuntime;

const GRID_ROWS: usize = 14;
const PRESET_PATH: &str = "preset.json";

/// Terminal presentation adapter. Pure consumer of the AudioRuntime command
/// API: every gesture becomes one runtime call, every tick pulls state back
/// out for display.
pub struct EditorController {
    runtime: AudioRuntime,
    config: EditorConfig,
    track_path: Option<String>,

    // Peak envelope for the loaded track at the current zoom.
    peaks: Vec<f32>,

    // --- redraw cache ---
    cached_play_secs: u64,
    cached_playing: bool,
    waveform_drawn: bool,
    force_redraw: bool,

    ascii_grid: Vec<String>,
    draw_buffer: String,
    status_message: String,
}

impl EditorController {
    pub fn new(config: EditorConfig, track_path: Option<String>) -> Result<Self, anyhow::Error> {
        let runtime = AudioRuntime::new()?;

        if let Some(path) = track_path.as_ref() {
            runtime.load_track(path)?;
        }

        let ascii_grid = vec![String::with_capacity(config.waveform_columns); GRID_ROWS];

        let mut controller = Self {
            runtime,
            config,
            track_path,
            peaks: Vec::new(),
            cached_play_secs: u64::MAX,
            cached_playing: false,
            waveform_drawn: false,
            force_redraw: true,
            ascii_grid,
            draw_buffer: String::with_capacity(4096),
            status_message: String::new(),
        };
        controller.rebuild_peaks();
        Ok(controller)
    }

    pub fn ui_tick_ms(&self) -> u64 {
        self.config.ui_tick_ms
    }

    pub fn should_quit(&self, key: KeyCode) -> bool {
        matches!(key, KeyCode::Char('q') | KeyCode::Char('Q'))
    }

    fn rebuild_peaks(&mut self) {
        self.peaks = match self.runtime.source() {
            Some(source) => {
                Waveform::build(&source, self.config.waveform_columns, self.runtime.zoom()).peaks
            }
            None => Vec::new(),
        };
        self.waveform_drawn = false;
        self.force_redraw = true;
    }

    // -------------------------------------------------------------
    // Input
    // -------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyCode, modifiers: crossterm::event::KeyModifiers) {
        if self.handle_global_shortcuts(key, modifiers) {
            return;
        }
        self.handle_transport_keys(key);
        self.handle_region_keys(key);
        self.handle_effect_keys(key);
        self.handle_zoom_keys(key);
    }

    /// Returns true if a CTRL shortcut consumed the event.
    fn handle_global_shortcuts(
        &mut self,
        key: KeyCode,
        modifiers: crossterm::event::KeyModifiers,
    ) -> bool {
        if !modifiers.contains(crossterm::event::KeyModifiers::CONTROL) {
            return false;
        }

        match key {
            // [CTRL + S] => save effect preset
            KeyCode::Char('s') | KeyCode::Char('S') => {
                match self.runtime.preset_snapshot() {
                    Some(preset) => match preset.save_to_disk(PRESET_PATH) {
                        Ok(()) => self.set_status(format!("preset saved to {PRESET_PATH}")),
                        Err(e) => self.set_status(format!("preset save failed: {e}")),
                    },
                    None => self.set_status("preset save failed: engine busy".into()),
                }
                true
            }
            // [CTRL + O] => load effect preset
            KeyCode::Char('o') | KeyCode::Char('O') => {
                match PresetManifest::load_from_disk(PRESET_PATH) {
                    Ok(preset) => {
                        self.runtime.apply_preset(&preset);
                        self.rebuild_peaks(); // zoom may have changed
                        self.set_status(format!("preset loaded from {PRESET_PATH}"));
                    }
                    Err(e) => self.set_status(format!("preset load failed: {e}")),
                }
                true
            }
            _ => false,
        }
    }

    fn handle_transport_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(' ') => {
                self.runtime.toggle_play();
                self.force_redraw = true;
            }
            KeyCode::Left => self.runtime.seek_by(-5.0),
            KeyCode::Right => self.runtime.seek_by(5.0),
            KeyCode::Up => {
                let v = self.runtime.volume() + 0.05;
                self.runtime.set_volume(v);
                self.force_redraw = true;
            }
            KeyCode::Down => {
                let v = self.runtime.volume() - 0.05;
                self.runtime.set_volume(v);
                self.force_redraw = true;
            }
            KeyCode::Char('w') | KeyCode::Char('W') => self.export_current(),
            _ => {}
        }
    }

    fn handle_region_keys(&mut self, key: KeyCode) {
        match key {
            // Mark a five-second region from the playhead (shorter at EOF).
            KeyCode::Char('g') | KeyCode::Char('G') => {
                let start = self.runtime.position_secs();
                let end = (start + 5.0).min(self.runtime.duration_secs());
                if self.runtime.set_region(start, end) {
                    self.set_status(format!("region {start:.2}s - {end:.2}s"));
                } else {
                    self.set_status("region rejected".into());
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                self.runtime.clear_region();
                self.set_status("region cleared".into());
            }
            _ => {}
        }
    }

    fn handle_effect_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('e') | KeyCode::Char('E') => self.toggle_effect(EffectKind::Eq),
            KeyCode::Char('c') | KeyCode::Char('C') => self.toggle_effect(EffectKind::Compression),
            KeyCode::Char('r') | KeyCode::Char('R') => self.toggle_effect(EffectKind::Reverb),

            // EQ gains: low Z/X, mid N/M, high U/I
            KeyCode::Char('z') => self.nudge_param(EffectKind::Eq, "low", -1.0),
            KeyCode::Char('x') => self.nudge_param(EffectKind::Eq, "low", 1.0),
            KeyCode::Char('n') => self.nudge_param(EffectKind::Eq, "mid", -1.0),
            KeyCode::Char('m') => self.nudge_param(EffectKind::Eq, "mid", 1.0),
            KeyCode::Char('u') => self.nudge_param(EffectKind::Eq, "high", -1.0),
            KeyCode::Char('i') => self.nudge_param(EffectKind::Eq, "high", 1.0),

            // Compressor: threshold T/Y, ratio K/L
            KeyCode::Char('t') => self.nudge_param(EffectKind::Compression, "threshold", -2.0),
            KeyCode::Char('y') => self.nudge_param(EffectKind::Compression, "threshold", 2.0),
            KeyCode::Char('k') => self.nudge_param(EffectKind::Compression, "ratio", -1.0),
            KeyCode::Char('l') => self.nudge_param(EffectKind::Compression, "ratio", 1.0),

            // Reverb: decay [/], wet 9/0
            KeyCode::Char('[') => self.nudge_param(EffectKind::Reverb, "decay", -0.5),
            KeyCode::Char(']') => self.nudge_param(EffectKind::Reverb, "decay", 0.5),
            KeyCode::Char('9') => self.nudge_param(EffectKind::Reverb, "wet", -0.05),
            KeyCode::Char('0') => self.nudge_param(EffectKind::Reverb, "wet", 0.05),
            _ => {}
        }
    }

    fn handle_zoom_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let z = self.runtime.zoom() + 1.0;
                self.runtime.set_zoom(z);
                self.rebuild_peaks();
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                let z = self.runtime.zoom() - 1.0;
                self.runtime.set_zoom(z);
                self.rebuild_peaks();
            }
            _ => {}
        }
    }

    fn toggle_effect(&mut self, kind: EffectKind) {
        let on = self.runtime.toggle_effect(kind);
        self.set_status(format!(
            "{} {}",
            kind.name(),
            if on { "enabled" } else { "bypassed" }
        ));
    }

    fn nudge_param(&mut self, kind: EffectKind, param: &str, delta: f32) {
        let s = self.runtime.effect_settings();
        let current = match (kind, param) {
            (EffectKind::Eq, "low") => s.eq.low_db,
            (EffectKind::Eq, "mid") => s.eq.mid_db,
            (EffectKind::Eq, "high") => s.eq.high_db,
            (EffectKind::Compression, "threshold") => s.compression.threshold_db,
            (EffectKind::Compression, "ratio") => s.compression.ratio,
            (EffectKind::Reverb, "decay") => s.reverb.decay_secs,
            (EffectKind::Reverb, "wet") => s.reverb.wet,
            _ => return,
        };
        let target = current + delta;
        if self.runtime.set_effect_param(kind, param, target) {
            // Read back: the engine may have clamped.
            let applied = self.runtime.effect_settings();
            let shown = match (kind, param) {
                (EffectKind::Eq, "low") => applied.eq.low_db,
                (EffectKind::Eq, "mid") => applied.eq.mid_db,
                (EffectKind::Eq, "high") => applied.eq.high_db,
                (EffectKind::Compression, "threshold") => applied.compression.threshold_db,
                (EffectKind::Compression, "ratio") => applied.compression.ratio,
                (EffectKind::Reverb, "decay") => applied.reverb.decay_secs,
                (EffectKind::Reverb, "wet") => applied.reverb.wet,
                _ => target,
            };
            self.set_status(format!("{}/{param} = {shown:.2}", kind.name()));
        }
    }

    fn export_current(&mut self) {
        let Some(path) = self.track_path.clone() else {
            self.set_status("nothing to export".into());
            return;
        };
        let out = export::default_export_path(&path);
        match self.runtime.export(&out) {
            Ok(()) => self.set_status(format!("exported {out}")),
            Err(e) => self.set_status(format!("export failed: {e}")),
        }
    }

    fn set_status(&mut self, message: String) {
        self.status_message = message;
        self.force_redraw = true;
    }

    // -------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------

    pub fn run_tick(&mut self) -> Result<(), anyhow::Error> {
        // Pull the driver position into the displayed state (polling sync).
        let curr_secs = self.runtime.position_secs() as u64;
        let playing = self.runtime.is_playing();

        let time_changed = curr_secs != self.cached_play_secs || playing != self.cached_playing;
        let static_wf_needs_draw = !self.peaks.is_empty() && !self.waveform_drawn;

        if !time_changed && !static_wf_needs_draw && !self.force_redraw {
            return Ok(());
        }

        self.cached_play_secs = curr_secs;
        self.cached_playing = playing;
        self.force_redraw = false;

        self.draw_buffer.clear();

        if static_wf_needs_draw || time_changed {
            self.update_ascii_grid();
            self.waveform_drawn = true;
        }

        let _ = write!(self.draw_buffer, "{}", MoveTo(0, 0));
        for line in &self.ascii_grid {
            let _ = write!(self.draw_buffer, "{}\x1b[K\n", line);
        }

        let _ = write!(self.draw_buffer, "{}", MoveTo(0, GRID_ROWS as u16 + 1));
        let _ = write!(self.draw_buffer, "{}", Clear(ClearType::UntilNewLine));
        self.render_status_line(curr_secs, playing);

        let mut stdout = stdout();
        execute!(stdout, BeginSynchronizedUpdate)?;
        stdout.write_all(self.draw_buffer.as_bytes())?;
        execute!(stdout, EndSynchronizedUpdate)?;
        stdout.flush()?;

        Ok(())
    }

    fn render_status_line(&mut self, curr_secs: u64, playing: bool) {
        let total = self.runtime.duration_secs() as u64;
        let s = self.runtime.effect_settings();
        let flags = format!(
            "[{}{}{}]",
            if s.eq.enabled { 'E' } else { '-' },
            if s.compression.enabled { 'C' } else { '-' },
            if s.reverb.enabled { 'R' } else { '-' },
        );
        let region = match self.runtime.region() {
            Some(r) => format!(" region {:.1}-{:.1}s", r.start, r.end),
            None => String::new(),
        };

        let _ = write!(
            self.draw_buffer,
            "{} {:02}:{:02} / {:02}:{:02} | vol {:>3.0}% | zoom x{:.0} | fx {}{}",
            if playing { "▶" } else { "⏸" },
            curr_secs / 60,
            curr_secs % 60,
            total / 60,
            total % 60,
            self.runtime.volume() * 100.0,
            self.runtime.zoom(),
            flags,
            region,
        );
        if !self.status_message.is_empty() {
            let _ = write!(self.draw_buffer, " | {}", self.status_message);
        }
    }

    fn update_ascii_grid(&mut self) {
        for line in &mut self.ascii_grid {
            line.clear();
        }
        if self.peaks.is_empty() {
            self.ascii_grid[GRID_ROWS / 2].push_str("  (no track loaded)");
            return;
        }

        let cols = self.config.waveform_columns;
        let total = self.peaks.len();
        let duration = self.runtime.duration_secs().max(f64::EPSILON);
        let playhead_bucket =
            ((self.runtime.position_secs() / duration) * total as f64) as usize;

        // Scroll the view so the playhead stays visible when zoomed in.
        let start = if total <= cols {
            0
        } else {
            playhead_bucket
                .saturating_sub(cols / 2)
                .min(total - cols)
        };
        let visible = &self.peaks[start..(start + cols).min(total)];

        let region_span = self.runtime.region().map(|r| {
            let a = ((r.start / duration) * total as f64) as usize;
            let b = ((r.end / duration) * total as f64) as usize;
            (a, b)
        });

        let height = GRID_ROWS - 1; // last row is the ruler
        for (i, peak) in visible.iter().enumerate() {
            let bucket = start + i;
            let bar_rows = ((peak.min(1.0)) * height as f32).round() as usize;
            let top = (height - bar_rows) / 2;

            let in_region = region_span
                .map(|(a, b)| bucket >= a && bucket < b)
                .unwrap_or(false);
            let bar_ch = if in_region { '┃' } else { '│' };

            for row in 0..height {
                let ch = if row >= top && row < top + bar_rows {
                    bar_ch
                } else if row == height / 2 {
                    '─'
                } else {
                    ' '
                };
                self.ascii_grid[row].push(ch);
            }

            // Ruler row: playhead marker and region extent.
            let ruler_ch = if bucket == playhead_bucket.min(total.saturating_sub(1)) {
                '▲'
            } else if in_region {
                '═'
            } else {
                ' '
            };
            self.ascii_grid[height].push(ruler_ch);
        }
    }
}
