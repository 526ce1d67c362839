//! Simulated position sources standing in for a camera + face detector.
pub mod error;
pub mod util;

use crate::error::{Result, SimError};
use crate::util::XorShift32;
use steady_traits::{Centroid, Detection, PositionSource};

type SourceResult = std::result::Result<Option<Detection>, Box<dyn std::error::Error + Send + Sync>>;

/// Default face box size (pixels) reported with generated centroids.
pub const FACE_BOX: (f64, f64) = (120.0, 150.0);

/// Replays a fixed list of observations.
///
/// Once exhausted it either starts over (`looping`) or reports the subject
/// as gone.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    script: Vec<Option<Detection>>,
    cursor: usize,
    looping: bool,
}

impl ScriptedSource {
    pub fn new(script: Vec<Option<Detection>>) -> Result<Self> {
        if script.is_empty() {
            return Err(SimError::EmptyScript);
        }
        Ok(Self {
            script,
            cursor: 0,
            looping: false,
        })
    }

    pub fn from_centroids(centroids: impl IntoIterator<Item = Option<Centroid>>) -> Result<Self> {
        let (w, h) = FACE_BOX;
        Self::new(
            centroids
                .into_iter()
                .map(|c| {
                    c.map(|centroid| Detection {
                        centroid,
                        width: w,
                        height: h,
                    })
                })
                .collect(),
        )
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// True once a non-looping script has been played to the end.
    pub fn is_exhausted(&self) -> bool {
        !self.looping && self.cursor >= self.script.len()
    }
}

impl PositionSource for ScriptedSource {
    fn next_sample(&mut self) -> SourceResult {
        if self.cursor >= self.script.len() {
            if !self.looping {
                return Ok(None);
            }
            self.cursor = 0;
        }
        let s = self.script[self.cursor];
        self.cursor += 1;
        Ok(s)
    }
}

/// A subject that never holds perfectly still.
///
/// Each frame reports `anchor + drift * frame + jitter`, where jitter is
/// uniform in `[-jitter_px, jitter_px)` per axis. Every `dropout_every`-th
/// frame reports no detection; every `fail_every`-th frame fails outright.
#[derive(Debug, Clone)]
pub struct DriftSource {
    anchor: Centroid,
    jitter_px: f64,
    drift: (f64, f64),
    dropout_every: u64,
    fail_every: u64,
    frame: u64,
    rng: XorShift32,
}

impl DriftSource {
    pub fn new(anchor: Centroid, jitter_px: f64) -> Result<Self> {
        if anchor.is_degenerate() {
            return Err(SimError::InvalidParameter("anchor must be finite and non-negative"));
        }
        if !jitter_px.is_finite() || jitter_px < 0.0 {
            return Err(SimError::InvalidParameter("jitter_px must be finite and >= 0"));
        }
        Ok(Self {
            anchor,
            jitter_px,
            drift: (0.0, 0.0),
            dropout_every: 0,
            fail_every: 0,
            frame: 0,
            rng: XorShift32::new(0x5EED),
        })
    }

    /// Per-frame displacement added on top of the jitter.
    pub fn with_drift(mut self, dx: f64, dy: f64) -> Result<Self> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(SimError::InvalidParameter("drift must be finite"));
        }
        self.drift = (dx, dy);
        Ok(self)
    }

    /// Drop every n-th frame; 0 disables.
    pub fn with_dropout_every(mut self, n: u64) -> Self {
        self.dropout_every = n;
        self
    }

    /// Fail every n-th frame with a capture error; 0 disables.
    pub fn with_failure_every(mut self, n: u64) -> Self {
        self.fail_every = n;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.rng = XorShift32::new(seed);
        self
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl PositionSource for DriftSource {
    fn next_sample(&mut self) -> SourceResult {
        self.frame += 1;
        let frame = self.frame;
        if self.fail_every > 0 && frame % self.fail_every == 0 {
            return Err(Box::new(SimError::CaptureFailed { frame }));
        }
        if self.dropout_every > 0 && frame % self.dropout_every == 0 {
            tracing::trace!(frame, "simulated dropout");
            return Ok(None);
        }
        let n = (frame - 1) as f64;
        // Keep inside the frame; a drifting subject pins at the edge.
        let x = (self.anchor.x + self.drift.0 * n + self.rng.symmetric(self.jitter_px)).max(0.0);
        let y = (self.anchor.y + self.drift.1 * n + self.rng.symmetric(self.jitter_px)).max(0.0);
        let (w, h) = FACE_BOX;
        Ok(Some(Detection {
            centroid: Centroid::new(x, y),
            width: w,
            height: h,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xorshift_is_deterministic() {
        let mut a = XorShift32::new(7);
        let mut b = XorShift32::new(7);
        for _ in 0..100 {
            let u = a.next_unit();
            assert_eq!(u, b.next_unit());
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn zero_seed_does_not_stick() {
        let mut r = XorShift32::new(0);
        assert_ne!(r.next_u32(), 0);
    }

    #[test]
    fn scripted_source_runs_dry() {
        let mut s = ScriptedSource::from_centroids([Some(Centroid::new(1.0, 2.0)), None]).unwrap();
        assert_eq!(
            s.next_sample().unwrap().map(|d| d.centroid),
            Some(Centroid::new(1.0, 2.0))
        );
        assert_eq!(s.next_sample().unwrap(), None);
        assert!(s.is_exhausted());
        assert_eq!(s.next_sample().unwrap(), None);
    }
}
