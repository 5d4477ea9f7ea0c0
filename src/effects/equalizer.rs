// src/effects/equalizer.rs

use biquad::*;

use crate::effects::EqSettings;

struct EqBand {
    coeffs: Coefficients<f32>,
    filters: Vec<DirectForm2Transposed<f32>>,
    kind: BandKind,
    freq: f32,
    q: f32,
    gain_db: f32,
    sr: u32,
}

#[derive(Clone, Copy, PartialEq)]
enum BandKind {
    LowShelf,
    Peaking,
    HighShelf,
}

impl EqBand {
    fn new(sr: u32, channels: usize, kind: BandKind, freq: f32, q: f32) -> Self {
        let coeffs = Coefficients::<f32>::from_params(
            Type::PeakingEQ(0.0.into()),
            sr.hz(),
            1000.0.hz(),
            0.707.into(),
        )
        .unwrap();

        let mut filters = Vec::with_capacity(channels);
        for _ in 0..channels {
            filters.push(DirectForm2Transposed::<f32>::new(coeffs));
        }

        let mut band = Self {
            coeffs,
            filters,
            kind,
            freq,
            q,
            gain_db: 0.0,
            sr,
        };
        band.update_coefficients(true);
        band
    }

    fn set_gain(&mut self, gain_db: f32) {
        if (self.gain_db - gain_db).abs() < f32::EPSILON {
            return;
        }
        self.gain_db = gain_db;
        self.update_coefficients(false);
    }

    fn update_coefficients(&mut self, reset_state: bool) {
        // Freq must stay below Nyquist, Q above zero.
        let safe_freq = self.freq.clamp(20.0, (self.sr as f32 / 2.0) - 1.0);
        let safe_q = self.q.max(0.1);

        let biquad_type = match self.kind {
            BandKind::LowShelf => Type::LowShelf(self.gain_db.into()),
            BandKind::Peaking => Type::PeakingEQ(self.gain_db.into()),
            BandKind::HighShelf => Type::HighShelf(self.gain_db.into()),
        };

        if let Ok(new_coeffs) = Coefficients::<f32>::from_params(
            biquad_type,
            self.sr.hz(),
            safe_freq.hz(),
            safe_q.into(),
        ) {
            self.coeffs = new_coeffs;
            for filter in &mut self.filters {
                if reset_state {
                    filter.reset_state();
                }
                filter.update_coefficients(self.coeffs);
            }
        } else {
            log::warn!("failed to calculate EQ coefficients for freq {safe_freq}");
        }
    }

    fn reset_state(&mut self) {
        for filter in &mut self.filters {
            filter.reset_state();
        }
    }

    #[inline]
    fn process(&mut self, sample: f32, channel_idx: usize) -> f32 {
        if let Some(filter) = self.filters.get_mut(channel_idx) {
            let out = filter.run(sample);
            // Denormal protection
            if out.abs() < 1e-20 {
                return 0.0;
            }
            return out;
        }
        sample
    }
}

/// Three-band tone control: low shelf at 400 Hz, peaking mid at 1 kHz, high
/// shelf at 2.5 kHz. Only the band gains are user-facing.
pub struct ThreeBandEq {
    bands: [EqBand; 3],
}

impl ThreeBandEq {
    pub fn new(sr: u32, channels: usize) -> Self {
        Self {
            bands: [
                EqBand::new(sr, channels, BandKind::LowShelf, 400.0, 0.707),
                EqBand::new(sr, channels, BandKind::Peaking, 1000.0, 1.0),
                EqBand::new(sr, channels, BandKind::HighShelf, 2500.0, 0.707),
            ],
        }
    }

    pub fn apply(&mut self, settings: &EqSettings) {
        self.bands[0].set_gain(settings.low_db);
        self.bands[1].set_gain(settings.mid_db);
        self.bands[2].set_gain(settings.high_db);
    }

    /// Drop accumulated filter state (on seek/source change) without touching
    /// the configured gains.
    pub fn reset_state(&mut self) {
        for band in &mut self.bands {
            band.reset_state();
        }
    }

    // Zero-allocation in-place processing
    pub fn process_buffer(&mut self, buffer: &mut [f32], channels: usize) {
        for frame in buffer.chunks_mut(channels) {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let mut s = *sample;
                for band in &mut self.bands {
                    s = band.process(s, ch);
                }
                *sample = s;
            }
        }
    }
}
