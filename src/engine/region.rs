// src/engine/region.rs

use serde::{Deserialize, Serialize};

/// A user-selected `[start, end)` slice of the track, in seconds.
/// Invariant: `0 <= start < end <= duration` of the active source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub start: f64,
    pub end: f64,
}

impl Region {
    /// Validate candidate bounds against the current source duration.
    /// Returns `None` for anything malformed; the caller keeps prior state.
    pub fn validated(start: f64, end: f64, duration: f64) -> Option<Self> {
        if !start.is_finite() || !end.is_finite() {
            return None;
        }
        if start < 0.0 || end > duration || start >= end {
            return None;
        }
        Some(Self { start, end })
    }

    pub fn len_secs(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordered_bounds_inside_the_track() {
        let r = Region::validated(2.0, 5.0, 10.0).unwrap();
        assert_eq!(r.len_secs(), 3.0);
    }

    #[test]
    fn rejects_reversed_or_degenerate_bounds() {
        assert!(Region::validated(5.0, 2.0, 10.0).is_none());
        assert!(Region::validated(3.0, 3.0, 10.0).is_none());
    }

    #[test]
    fn rejects_bounds_outside_the_track() {
        assert!(Region::validated(-0.5, 2.0, 10.0).is_none());
        assert!(Region::validated(2.0, 10.5, 10.0).is_none());
        assert!(Region::validated(0.0, f64::NAN, 10.0).is_none());
    }
}
