use crate::bbox::Bounds;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// What the map surface currently shows.
///
/// Produced on every pan/zoom settle. A new viewport fully replaces the
/// previous one; there is no partial update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: Bounds,
    pub zoom: f64,
    pub center: LatLng,
}

impl Viewport {
    pub fn new(bounds: Bounds, zoom: f64, center: LatLng) -> Self {
        Self {
            bounds,
            zoom,
            center,
        }
    }

    /// Build a viewport whose center is the middle of `bounds`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilescope_types::bbox::Bounds;
    /// use tilescope_types::viewport::Viewport;
    ///
    /// let vp = Viewport::from_bounds(Bounds::new(10.0, 0.0, 20.0, 10.0), 6.0);
    /// assert_eq!(vp.center.lat, 5.0);
    /// assert_eq!(vp.center.lng, 15.0);
    /// ```
    pub fn from_bounds(bounds: Bounds, zoom: f64) -> Self {
        let lat = (bounds.north + bounds.south) / 2.0;
        let mut lng = bounds.west + bounds.width() / 2.0;
        if lng > 180.0 {
            lng -= 360.0;
        }
        Self {
            bounds,
            zoom,
            center: LatLng::new(lat, lng),
        }
    }

    /// Whether moving from `self` to `other` changes the searched area.
    ///
    /// A change of zoom alone still counts: it changes the aggregation level.
    pub fn differs_from(&self, other: &Viewport) -> bool {
        self.bounds != other.bounds || self.zoom != other.zoom
    }
}
