//! Zoom resolution: continuous map zoom to aggregation level and display mode.
//!
//! The level table is shared with the aggregate builder, which precomputes one
//! hierarchy level per geohash precision. Each step is chosen so that a
//! typical 1024px-wide viewport spans roughly 8-16 cells of its level.

use tilescope_types::result::DisplayMode;

/// Coarsest aggregation level (geohash precision).
pub const MIN_LEVEL: u8 = 1;

/// Finest aggregation level (geohash precision).
pub const MAX_LEVEL: u8 = 6;

/// Highest zoom accepted from a map surface.
pub const MAX_ZOOM: f64 = 24.0;

/// `(minimum zoom, level)` steps, ascending in both columns.
pub const LEVEL_STEPS: [(f64, u8); 6] = [
    (0.0, 1),
    (3.0, 2),
    (6.0, 3),
    (8.0, 4),
    (11.0, 5),
    (13.0, 6),
];

/// Output of [`ZoomResolver::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub level: u8,
    pub mode: DisplayMode,
}

/// Level the step table assigns to `zoom`, before clamping to built levels.
pub fn base_level(zoom: f64) -> u8 {
    LEVEL_STEPS
        .iter()
        .take_while(|(min_zoom, _)| zoom >= *min_zoom)
        .last()
        .map(|(_, level)| *level)
        .unwrap_or(MIN_LEVEL)
}

/// Maps zoom to `{level, mode}` against the set of levels the index holds.
#[derive(Debug, Clone)]
pub struct ZoomResolver {
    levels: Vec<u8>,
    individual_zoom: f64,
}

impl ZoomResolver {
    /// `levels` must be non-empty; it is sorted and deduplicated here.
    pub fn new(levels: &[u8], individual_zoom: f64) -> Self {
        let mut levels = levels.to_vec();
        levels.sort_unstable();
        levels.dedup();
        if levels.is_empty() {
            levels.push(MIN_LEVEL);
        }
        Self {
            levels,
            individual_zoom,
        }
    }

    pub fn levels(&self) -> &[u8] {
        &self.levels
    }

    pub fn individual_zoom(&self) -> f64 {
        self.individual_zoom
    }

    /// Resolve a zoom value. Deterministic and free of I/O apart from a
    /// warning when the table level is not built and has to be clamped.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilescope::compute::zoom::ZoomResolver;
    /// use tilescope_types::result::DisplayMode;
    ///
    /// let resolver = ZoomResolver::new(&[1, 2, 3, 4, 5, 6], 15.0);
    /// let wide = resolver.resolve(4.0);
    /// assert_eq!(wide.level, 2);
    /// assert_eq!(wide.mode, DisplayMode::Clusters);
    /// assert_eq!(resolver.resolve(16.0).mode, DisplayMode::IndividualItems);
    /// ```
    pub fn resolve(&self, zoom: f64) -> Resolution {
        let wanted = base_level(zoom);
        let level = self.nearest_level(wanted);
        if level != wanted {
            log::warn!(
                "Zoom {} maps to level {} which is not built; clamped to level {}",
                zoom,
                wanted,
                level
            );
        }

        let mode = if zoom >= self.individual_zoom {
            DisplayMode::IndividualItems
        } else {
            DisplayMode::Clusters
        };

        Resolution { level, mode }
    }

    /// Closest built level; ties go to the coarser one.
    fn nearest_level(&self, wanted: u8) -> u8 {
        let mut best = self.levels[0];
        for &level in &self.levels {
            if level.abs_diff(wanted) < best.abs_diff(wanted) {
                best = level;
            }
        }
        best
    }
}
