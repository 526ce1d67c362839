pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Subject centroid in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

impl Centroid {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels. NaN if either point carries NaN.
    #[inline]
    pub fn distance_to(&self, other: &Centroid) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// A centroid the detector should never have produced: non-finite or
    /// negative coordinates.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.x.is_finite() && self.y.is_finite()) || self.x < 0.0 || self.y < 0.0
    }
}

/// One detector hit: the subject centroid plus its bounding box size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub centroid: Centroid,
    pub width: f64,
    pub height: f64,
}

impl Detection {
    /// Build a detection from a top-left anchored bounding box.
    pub fn from_bbox(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            centroid: Centroid::new(x + width / 2.0, y + height / 2.0),
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// The capture/detector collaborator: yields one observation per tick.
///
/// `Ok(None)` means the subject was not detected this tick. `Err` is a
/// capture failure; consumers treat it as detection loss.
pub trait PositionSource {
    fn next_sample(&mut self) -> Result<Option<Detection>, Box<dyn std::error::Error + Send + Sync>>;
}

impl<P: PositionSource + ?Sized> PositionSource for Box<P> {
    fn next_sample(&mut self) -> Result<Option<Detection>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).next_sample()
    }
}
