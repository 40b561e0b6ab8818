use geo::Rect;
use serde::{Deserialize, Serialize};

/// Geographic bounds of a viewport or an index cell, in degrees.
///
/// `west > east` describes a box that crosses the antimeridian; use
/// [`Bounds::to_rects`] to obtain the one or two planar rectangles it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    /// Create bounds from the four edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilescope_types::bbox::Bounds;
    ///
    /// let lisbon = Bounds::new(38.80, 38.69, -9.09, -9.23);
    /// assert!(lisbon.contains(38.72, -9.14));
    /// ```
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Create bounds from a planar `geo::Rect` (x = longitude, y = latitude).
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            north: rect.max().y,
            south: rect.min().y,
            east: rect.max().x,
            west: rect.min().x,
        }
    }

    /// Whether the box wraps across the ±180° meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Whether every edge is a finite number.
    pub fn is_finite(&self) -> bool {
        self.north.is_finite()
            && self.south.is_finite()
            && self.east.is_finite()
            && self.west.is_finite()
    }

    /// Planar rectangles covered by these bounds (two when crossing the antimeridian).
    pub fn to_rects(&self) -> Vec<Rect> {
        if self.crosses_antimeridian() {
            vec![
                Rect::new(
                    geo::coord! { x: self.west, y: self.south },
                    geo::coord! { x: 180.0, y: self.north },
                ),
                Rect::new(
                    geo::coord! { x: -180.0, y: self.south },
                    geo::coord! { x: self.east, y: self.north },
                ),
            ]
        } else {
            vec![Rect::new(
                geo::coord! { x: self.west, y: self.south },
                geo::coord! { x: self.east, y: self.north },
            )]
        }
    }

    /// Longitudinal extent in degrees, accounting for antimeridian wrap.
    pub fn width(&self) -> f64 {
        if self.crosses_antimeridian() {
            (180.0 - self.west) + (self.east + 180.0)
        } else {
            self.east - self.west
        }
    }

    /// Latitudinal extent in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Check if a coordinate lies inside (edges inclusive).
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            lng >= self.west || lng <= self.east
        } else {
            lng >= self.west && lng <= self.east
        }
    }

    /// Check if another box lies entirely inside this one.
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        if other.north > self.north || other.south < self.south {
            return false;
        }
        match (self.crosses_antimeridian(), other.crosses_antimeridian()) {
            (false, true) => false,
            (false, false) | (true, true) => other.west >= self.west && other.east <= self.east,
            (true, false) => other.west >= self.west || other.east <= self.east,
        }
    }

    /// Check if this box intersects another (edges inclusive).
    pub fn intersects(&self, other: &Bounds) -> bool {
        if self.south > other.north || self.north < other.south {
            return false;
        }
        self.to_rects().iter().any(|a| {
            other
                .to_rects()
                .iter()
                .any(|b| a.min().x <= b.max().x && a.max().x >= b.min().x)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_extent() {
        let bbox = Bounds::new(10.0, 0.0, 10.0, 0.0);
        assert!(bbox.contains(5.0, 5.0));
        assert!(bbox.contains(10.0, 0.0));
        assert!(!bbox.contains(11.0, 5.0));
        assert_eq!(bbox.width(), 10.0);
        assert_eq!(bbox.height(), 10.0);
    }

    #[test]
    fn test_antimeridian_split() {
        let fiji = Bounds::new(-15.0, -20.0, -178.0, 176.0);
        assert!(fiji.crosses_antimeridian());
        assert_eq!(fiji.to_rects().len(), 2);
        assert!(fiji.contains(-17.0, 179.0));
        assert!(fiji.contains(-17.0, -179.0));
        assert!(!fiji.contains(-17.0, 0.0));
        assert!((fiji.width() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_intersects() {
        let a = Bounds::new(10.0, 0.0, 10.0, 0.0);
        let b = Bounds::new(15.0, 5.0, 15.0, 5.0);
        let c = Bounds::new(30.0, 20.0, 30.0, 20.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let wrap = Bounds::new(5.0, -5.0, -170.0, 170.0);
        let east_cell = Bounds::new(1.0, 0.0, 180.0, 175.0);
        assert!(wrap.intersects(&east_cell));
        assert!(!wrap.intersects(&a));
    }

    #[test]
    fn test_contains_bounds() {
        let outer = Bounds::new(10.0, 0.0, 10.0, 0.0);
        assert!(outer.contains_bounds(&Bounds::new(5.0, 1.0, 5.0, 1.0)));
        assert!(!outer.contains_bounds(&Bounds::new(5.0, 1.0, 12.0, 1.0)));

        let wrap = Bounds::new(5.0, -5.0, -170.0, 170.0);
        assert!(wrap.contains_bounds(&Bounds::new(1.0, 0.0, 175.0, 172.0)));
        assert!(!wrap.contains_bounds(&Bounds::new(1.0, 0.0, -175.0, 0.0)));
    }
}
