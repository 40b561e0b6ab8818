//! Validation of viewports, filters, pagination and ingested listings.

use crate::compute::zoom::MAX_ZOOM;
use crate::error::{Result, SearchError, TilescopeError};
use tilescope_types::bbox::Bounds;
use tilescope_types::filter::Filters;
use tilescope_types::listing::Listing;
use tilescope_types::viewport::Viewport;

/// Validates a coordinate pair has valid latitude and longitude.
///
/// Latitude: [-90.0, 90.0], Longitude: [-180.0, 180.0]
///
/// # Examples
///
/// ```
/// use tilescope::compute::validation::validate_coordinate;
///
/// assert!(validate_coordinate(38.72, -9.14).is_ok());
/// assert!(validate_coordinate(95.0, 0.0).is_err());
/// assert!(validate_coordinate(0.0, f64::NAN).is_err());
/// ```
pub fn validate_coordinate(lat: f64, lng: f64) -> std::result::Result<(), String> {
    if !lat.is_finite() {
        return Err(format!("Latitude must be finite, got: {}", lat));
    }
    if !lng.is_finite() {
        return Err(format!("Longitude must be finite, got: {}", lng));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("Latitude out of range [-90.0, 90.0]: {}", lat));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(format!("Longitude out of range [-180.0, 180.0]: {}", lng));
    }
    Ok(())
}

/// Validates viewport bounds: finite, in range and non-degenerate.
pub fn validate_bounds(bounds: &Bounds) -> std::result::Result<(), SearchError> {
    if !bounds.is_finite() {
        return Err(SearchError::InvalidViewport(format!(
            "Bounds must be finite, got: {:?}",
            bounds
        )));
    }
    validate_coordinate(bounds.north, bounds.east).map_err(SearchError::InvalidViewport)?;
    validate_coordinate(bounds.south, bounds.west).map_err(SearchError::InvalidViewport)?;

    if bounds.north <= bounds.south {
        return Err(SearchError::InvalidViewport(format!(
            "North edge {} must be above south edge {}",
            bounds.north, bounds.south
        )));
    }
    if bounds.east == bounds.west {
        return Err(SearchError::InvalidViewport(format!(
            "East and west edges coincide at {}",
            bounds.east
        )));
    }
    Ok(())
}

/// Validates a viewport: bounds, zoom in `[0, MAX_ZOOM]`, and a finite center.
///
/// # Examples
///
/// ```
/// use tilescope::compute::validation::validate_viewport;
/// use tilescope_types::bbox::Bounds;
/// use tilescope_types::viewport::Viewport;
///
/// let ok = Viewport::from_bounds(Bounds::new(41.2, 41.1, -8.5, -8.7), 12.0);
/// assert!(validate_viewport(&ok).is_ok());
///
/// let flat = Viewport::from_bounds(Bounds::new(41.1, 41.1, -8.5, -8.7), 12.0);
/// assert!(validate_viewport(&flat).is_err());
/// ```
pub fn validate_viewport(viewport: &Viewport) -> std::result::Result<(), SearchError> {
    validate_bounds(&viewport.bounds)?;

    if !viewport.zoom.is_finite() || !(0.0..=MAX_ZOOM).contains(&viewport.zoom) {
        return Err(SearchError::InvalidViewport(format!(
            "Zoom out of range [0, {}]: {}",
            MAX_ZOOM, viewport.zoom
        )));
    }
    if !viewport.center.is_finite() {
        return Err(SearchError::InvalidViewport(format!(
            "Center must be finite, got: {:?}",
            viewport.center
        )));
    }
    Ok(())
}

/// Validates filter values are inside their domains.
pub fn validate_filters(filters: &Filters) -> std::result::Result<(), SearchError> {
    for (name, value) in [("min_price", filters.min_price), ("max_price", filters.max_price)] {
        if let Some(v) = value
            && (!v.is_finite() || v < 0.0)
        {
            return Err(SearchError::InvalidFilter(format!(
                "{} must be a non-negative number, got: {}",
                name, v
            )));
        }
    }

    if let (Some(min), Some(max)) = (filters.min_price, filters.max_price)
        && min > max
    {
        return Err(SearchError::InvalidFilter(format!(
            "min_price {} exceeds max_price {}",
            min, max
        )));
    }

    if let Some(baths) = filters.min_bathrooms
        && (!baths.is_finite() || baths < 0.0)
    {
        return Err(SearchError::InvalidFilter(format!(
            "min_bathrooms must be a non-negative number, got: {}",
            baths
        )));
    }

    for (name, value) in [
        ("property_type", filters.property_type.as_deref()),
        ("region", filters.region.as_deref()),
    ] {
        if let Some(v) = value
            && v.trim().is_empty()
        {
            return Err(SearchError::InvalidFilter(format!(
                "{} must not be blank",
                name
            )));
        }
    }

    Ok(())
}

/// Validates pagination: 1-based page, page size in `[1, max_page_size]`.
pub fn validate_page(
    page: u32,
    page_size: u32,
    max_page_size: u32,
) -> std::result::Result<(), SearchError> {
    if page == 0 {
        return Err(SearchError::InvalidFilter(
            "page numbers start at 1".to_string(),
        ));
    }
    if page_size == 0 || page_size > max_page_size {
        return Err(SearchError::InvalidFilter(format!(
            "page_size out of range [1, {}]: {}",
            max_page_size, page_size
        )));
    }
    Ok(())
}

/// Validates a listing before it enters the point store.
pub fn validate_listing(listing: &Listing) -> Result<()> {
    if listing.id.trim().is_empty() {
        return Err(TilescopeError::InvalidInput(
            "Listing id must not be blank".to_string(),
        ));
    }
    validate_coordinate(listing.lat, listing.lng).map_err(|e| {
        TilescopeError::InvalidInput(format!("Listing {}: {}", listing.id, e))
    })?;
    if !listing.price.is_finite() || listing.price < 0.0 {
        return Err(TilescopeError::InvalidInput(format!(
            "Listing {}: price must be a non-negative number, got: {}",
            listing.id, listing.price
        )));
    }
    if listing.property_type.trim().is_empty() {
        return Err(TilescopeError::InvalidInput(format!(
            "Listing {}: property_type must not be blank",
            listing.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescope_types::filter::ListingType;
    use tilescope_types::viewport::LatLng;

    fn viewport(bounds: Bounds, zoom: f64) -> Viewport {
        Viewport::from_bounds(bounds, zoom)
    }

    #[test]
    fn test_viewport_rejects_nan_and_degenerate() {
        let nan = viewport(Bounds::new(f64::NAN, 0.0, 1.0, 0.0), 5.0);
        assert!(matches!(
            validate_viewport(&nan),
            Err(SearchError::InvalidViewport(_))
        ));

        let inverted = viewport(Bounds::new(0.0, 1.0, 1.0, 0.0), 5.0);
        assert!(validate_viewport(&inverted).is_err());

        let zero_width = viewport(Bounds::new(1.0, 0.0, 3.0, 3.0), 5.0);
        assert!(validate_viewport(&zero_width).is_err());

        let out_of_range = viewport(Bounds::new(95.0, 0.0, 1.0, 0.0), 5.0);
        assert!(validate_viewport(&out_of_range).is_err());
    }

    #[test]
    fn test_viewport_rejects_bad_zoom_and_center() {
        let bounds = Bounds::new(1.0, 0.0, 1.0, 0.0);
        assert!(validate_viewport(&viewport(bounds, f64::INFINITY)).is_err());
        assert!(validate_viewport(&viewport(bounds, -1.0)).is_err());
        assert!(validate_viewport(&viewport(bounds, 25.0)).is_err());

        let mut vp = viewport(bounds, 3.0);
        vp.center = LatLng::new(f64::NAN, 0.0);
        assert!(validate_viewport(&vp).is_err());
    }

    #[test]
    fn test_viewport_accepts_antimeridian_crossing() {
        let vp = viewport(Bounds::new(-10.0, -20.0, -175.0, 175.0), 5.0);
        assert!(validate_viewport(&vp).is_ok());
    }

    #[test]
    fn test_filters_domain() {
        assert!(validate_filters(&Filters::new()).is_ok());
        assert!(validate_filters(&Filters::new().with_price_range(Some(-1.0), None)).is_err());
        assert!(
            validate_filters(&Filters::new().with_price_range(Some(10.0), Some(5.0))).is_err()
        );
        assert!(validate_filters(&Filters::new().with_min_bathrooms(f64::NAN)).is_err());
        assert!(matches!(
            validate_filters(&Filters::new().with_region("  ")),
            Err(SearchError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_page_validation() {
        assert!(validate_page(1, 20, 100).is_ok());
        assert!(validate_page(0, 20, 100).is_err());
        assert!(validate_page(1, 0, 100).is_err());
        assert!(validate_page(1, 101, 100).is_err());
    }

    #[test]
    fn test_listing_validation() {
        let ok = Listing::new("x", 10.0, 10.0, 1.0, ListingType::Sale, "house");
        assert!(validate_listing(&ok).is_ok());

        let mut bad = ok.clone();
        bad.lat = 91.0;
        assert!(validate_listing(&bad).is_err());

        let mut bad = ok.clone();
        bad.price = -5.0;
        assert!(validate_listing(&bad).is_err());

        let mut bad = ok;
        bad.id = String::new();
        assert!(validate_listing(&bad).is_err());
    }
}
