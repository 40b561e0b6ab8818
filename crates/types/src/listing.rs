use crate::filter::ListingType;
use serde::{Deserialize, Serialize};

/// An indexed property listing, as delivered by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub price: f64,
    #[serde(default = "Listing::default_currency")]
    pub currency: String,
    pub listing_type: ListingType,
    pub property_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: f64,
    /// Seconds since the Unix epoch; drives recency ordering.
    #[serde(default)]
    pub listed_at: u64,
}

impl Listing {
    fn default_currency() -> String {
        "EUR".to_string()
    }

    pub fn new(
        id: impl Into<String>,
        lat: f64,
        lng: f64,
        price: f64,
        listing_type: ListingType,
        property_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            price,
            currency: Self::default_currency(),
            listing_type,
            property_type: property_type.into(),
            title: String::new(),
            address: String::new(),
            city: String::new(),
            region: String::new(),
            bedrooms: 0,
            bathrooms: 0.0,
            listed_at: 0,
        }
    }

    pub fn with_rooms(mut self, bedrooms: u32, bathrooms: f64) -> Self {
        self.bedrooms = bedrooms;
        self.bathrooms = bathrooms;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>, city: impl Into<String>) -> Self {
        self.address = address.into();
        self.city = city.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn listed_at(mut self, secs: u64) -> Self {
        self.listed_at = secs;
        self
    }

    /// Read-only projection handed to map and list surfaces.
    pub fn to_item(&self) -> ListItem {
        ListItem {
            id: self.id.clone(),
            lat: self.lat,
            lng: self.lng,
            price: self.price,
            currency: self.currency.clone(),
            listing_type: self.listing_type,
            property_type: self.property_type.clone(),
            title: self.title.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
        }
    }
}

/// A single listing as rendered by a map marker or a list row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub price: f64,
    pub currency: String,
    pub listing_type: ListingType,
    pub property_type: String,
    pub title: String,
    pub address: String,
    pub city: String,
    pub bedrooms: u32,
    pub bathrooms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "id": "p-1",
            "lat": 41.15,
            "lng": -8.61,
            "price": 1200.0,
            "listing_type": "rent",
            "property_type": "apartment"
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.currency, "EUR");
        assert_eq!(listing.listing_type, ListingType::Rent);
        assert_eq!(listing.bedrooms, 0);
        assert_eq!(listing.listed_at, 0);
    }

    #[test]
    fn test_to_item_projection() {
        let listing = Listing::new("p-2", 1.0, 2.0, 10.0, ListingType::Sale, "house")
            .with_title("Cottage")
            .with_address("Rua A 1", "Braga")
            .with_rooms(3, 2.0);
        let item = listing.to_item();
        assert_eq!(item.id, "p-2");
        assert_eq!(item.title, "Cottage");
        assert_eq!(item.city, "Braga");
        assert_eq!(item.bedrooms, 3);
    }
}
