use crate::listing::Listing;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a listing is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Rent => "rent",
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering applied to the paginated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Most recently listed first.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// Search predicates. Every field is optional; `None` means no constraint.
///
/// Treated as an immutable value: callers replace the whole struct, and the
/// client store resets pagination whenever it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filters {
    #[serde(default)]
    pub listing_type: Option<ListingType>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub min_bedrooms: Option<u32>,
    #[serde(default)]
    pub min_bathrooms: Option<f64>,
    #[serde(default)]
    pub region: Option<String>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing_type(mut self, listing_type: ListingType) -> Self {
        self.listing_type = Some(listing_type);
        self
    }

    pub fn with_property_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = Some(property_type.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_min_bedrooms(mut self, bedrooms: u32) -> Self {
        self.min_bedrooms = Some(bedrooms);
        self
    }

    pub fn with_min_bathrooms(mut self, bathrooms: f64) -> Self {
        self.min_bathrooms = Some(bathrooms);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when only category predicates (listing type, property type) are
    /// set, i.e. the filter can be answered from per-node subcategory
    /// aggregates without looking at individual listings.
    pub fn is_category_only(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_bedrooms.is_none()
            && self.min_bathrooms.is_none()
            && self.region.is_none()
    }

    /// Whether a subcategory key (see [`subcategory_key`]) passes the
    /// category predicates.
    pub fn matches_subcategory(&self, listing_type: ListingType, property_type: &str) -> bool {
        self.listing_type.is_none_or(|t| t == listing_type)
            && self
                .property_type
                .as_deref()
                .is_none_or(|p| p.eq_ignore_ascii_case(property_type))
    }

    /// Exact evaluation of every predicate against one listing.
    pub fn matches(&self, listing: &Listing) -> bool {
        self.matches_subcategory(listing.listing_type, &listing.property_type)
            && self.min_price.is_none_or(|min| listing.price >= min)
            && self.max_price.is_none_or(|max| listing.price <= max)
            && self.min_bedrooms.is_none_or(|min| listing.bedrooms >= min)
            && self.min_bathrooms.is_none_or(|min| listing.bathrooms >= min)
            && self
                .region
                .as_deref()
                .is_none_or(|r| listing.region.eq_ignore_ascii_case(r))
    }
}

/// Key under which a node aggregates listings of one listing type and
/// property type, e.g. `"sale/apartment"`.
pub fn subcategory_key(listing_type: ListingType, property_type: &str) -> String {
    format!("{}/{}", listing_type, property_type.to_ascii_lowercase())
}

/// Inverse of [`subcategory_key`].
pub fn parse_subcategory_key(key: &str) -> Option<(ListingType, &str)> {
    let (kind, property_type) = key.split_once('/')?;
    let listing_type = match kind {
        "sale" => ListingType::Sale,
        "rent" => ListingType::Rent,
        _ => return None,
    };
    Some((listing_type, property_type))
}
