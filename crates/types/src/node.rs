use crate::bbox::Bounds;
use crate::filter::{Filters, parse_subcategory_key};
use crate::viewport::LatLng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pre-aggregated statistics of the listings of one subcategory inside a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryStats {
    pub count: u64,
    pub price_sum: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub lat_sum: f64,
    pub lng_sum: f64,
}

impl Default for SubcategoryStats {
    fn default() -> Self {
        Self {
            count: 0,
            price_sum: 0.0,
            min_price: f64::INFINITY,
            max_price: f64::NEG_INFINITY,
            lat_sum: 0.0,
            lng_sum: 0.0,
        }
    }
}

impl SubcategoryStats {
    /// Fold one listing into the aggregate.
    pub fn add(&mut self, lat: f64, lng: f64, price: f64) {
        self.count += 1;
        self.price_sum += price;
        self.min_price = self.min_price.min(price);
        self.max_price = self.max_price.max(price);
        self.lat_sum += lat;
        self.lng_sum += lng;
    }

    pub fn merge(&mut self, other: &SubcategoryStats) {
        self.count += other.count;
        self.price_sum += other.price_sum;
        self.min_price = self.min_price.min(other.min_price);
        self.max_price = self.max_price.max(other.max_price);
        self.lat_sum += other.lat_sum;
        self.lng_sum += other.lng_sum;
    }

    pub fn avg_price(&self) -> Option<f64> {
        (self.count > 0).then(|| self.price_sum / self.count as f64)
    }

    /// Count-weighted centroid of the aggregated listings.
    pub fn centroid(&self) -> Option<LatLng> {
        (self.count > 0).then(|| {
            LatLng::new(
                self.lat_sum / self.count as f64,
                self.lng_sum / self.count as f64,
            )
        })
    }
}

/// One cell of the precomputed spatial hierarchy.
///
/// `total_count` equals the number of listings inside `bounds` when the
/// node was built. Nodes are rebuilt out of band and never mutated by reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialIndexNode {
    /// Cell identifier (a geohash whose length equals `level`).
    pub id: String,
    pub level: u8,
    pub bounds: Bounds,
    /// Count-weighted centroid of the listings in the cell.
    pub center: LatLng,
    pub parent_id: Option<String>,
    pub total_count: u64,
    /// Aggregates keyed by `"{listing_type}/{property_type}"`.
    pub subcategories: BTreeMap<String, SubcategoryStats>,
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price: f64,
    /// Build time, seconds since the Unix epoch.
    pub updated_at: u64,
}

impl SpatialIndexNode {
    /// Listing counts per subcategory.
    pub fn counts_by_subcategory(&self) -> BTreeMap<&str, u64> {
        self.subcategories
            .iter()
            .map(|(key, stats)| (key.as_str(), stats.count))
            .collect()
    }

    /// Combined aggregate of the subcategories that pass the category
    /// predicates of `filters`. Numeric predicates are not consulted.
    pub fn aggregate_matching(&self, filters: &Filters) -> SubcategoryStats {
        let mut acc = SubcategoryStats::default();
        for (key, stats) in &self.subcategories {
            let Some((listing_type, property_type)) = parse_subcategory_key(key) else {
                continue;
            };
            if filters.matches_subcategory(listing_type, property_type) {
                acc.merge(stats);
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ListingType, subcategory_key};

    fn node() -> SpatialIndexNode {
        let mut subcategories = BTreeMap::new();
        let mut sale = SubcategoryStats::default();
        sale.add(1.0, 1.0, 100.0);
        sale.add(3.0, 3.0, 300.0);
        let mut rent = SubcategoryStats::default();
        rent.add(2.0, 2.0, 10.0);
        subcategories.insert(subcategory_key(ListingType::Sale, "house"), sale);
        subcategories.insert(subcategory_key(ListingType::Rent, "house"), rent);

        SpatialIndexNode {
            id: "s".to_string(),
            level: 1,
            bounds: Bounds::new(45.0, 0.0, 45.0, 0.0),
            center: LatLng::new(2.0, 2.0),
            parent_id: None,
            total_count: 3,
            subcategories,
            min_price: 10.0,
            max_price: 300.0,
            avg_price: 410.0 / 3.0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_aggregate_matching() {
        let node = node();
        let all = node.aggregate_matching(&Filters::new());
        assert_eq!(all.count, 3);

        let sale = node.aggregate_matching(&Filters::new().with_listing_type(ListingType::Sale));
        assert_eq!(sale.count, 2);
        assert_eq!(sale.avg_price(), Some(200.0));
        assert_eq!(sale.centroid(), Some(LatLng::new(2.0, 2.0)));

        let flats = node.aggregate_matching(&Filters::new().with_property_type("apartment"));
        assert_eq!(flats.count, 0);
        assert_eq!(flats.avg_price(), None);
    }

    #[test]
    fn test_counts_by_subcategory() {
        let node = node();
        let counts = node.counts_by_subcategory();
        assert_eq!(counts.get("sale/house"), Some(&2));
        assert_eq!(counts.get("rent/house"), Some(&1));
    }
}
