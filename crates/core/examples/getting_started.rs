use tilescope::prelude::*;
use tilescope::{ClusterSource, geojson};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug to see detailed logs)
    env_logger::init();

    println!("=== Tilescope - Getting Started ===\n");

    let engine = Engine::builder()
        .config(Config::default().with_max_clusters(50))
        .listings([
            Listing::new("lx-1", 38.7223, -9.1393, 325_000.0, ListingType::Sale, "apartment")
                .with_rooms(2, 1.0)
                .with_title("Bright T2 in Baixa")
                .listed_at(1_700_000_300),
            Listing::new("lx-2", 38.7369, -9.1427, 1_450.0, ListingType::Rent, "apartment")
                .with_rooms(1, 1.0)
                .listed_at(1_700_000_200),
            Listing::new("lx-3", 38.7071, -9.1355, 890_000.0, ListingType::Sale, "house")
                .with_rooms(4, 3.0)
                .listed_at(1_700_000_100),
            Listing::new("op-1", 41.1579, -8.6291, 240_000.0, ListingType::Sale, "apartment")
                .listed_at(1_700_000_400),
            Listing::new("fa-1", 37.0194, -7.9304, 410_000.0, ListingType::Sale, "house")
                .listed_at(1_700_000_050),
        ])
        .build()?;
    println!("✓ Indexed {} listings\n", engine.len());

    // === CLUSTERS ===
    println!("1. Country view (clusters)");
    println!("--------------------------");
    let portugal = Viewport::from_bounds(Bounds::new(42.2, 36.9, -6.1, -9.6), 6.0);
    let result = engine.search(&SearchRequest::new(portugal, Filters::new()))?;
    println!("   mode={:?} level={} total={}", result.mode, result.meta.level, result.total);
    for cluster in result.clusters().unwrap_or_default() {
        println!(
            "     cluster {} at ({:.3}, {:.3}): {} listings",
            cluster.id, cluster.lat, cluster.lng, cluster.count
        );
    }
    println!();

    // === NUMERIC FILTERS ===
    println!("2. Sales under 500k (clusters stay exact)");
    println!("-----------------------------------------");
    let filters = Filters::new()
        .with_listing_type(ListingType::Sale)
        .with_price_range(None, Some(500_000.0));
    let result = engine.search(&SearchRequest::new(portugal, filters))?;
    println!(
        "   total={} map_count={} source={:?}",
        result.total,
        result.map_count(),
        result.meta.cluster_source.unwrap_or(ClusterSource::Live)
    );
    println!();

    // === INDIVIDUAL ITEMS ===
    println!("3. Street view of Lisbon (individual items)");
    println!("-------------------------------------------");
    let lisbon = Viewport::from_bounds(Bounds::new(38.75, 38.70, -9.12, -9.16), 16.0);
    let request = SearchRequest::new(lisbon, Filters::new())
        .page(1, 2)
        .sort(SortOrder::PriceDesc);
    let result = engine.search(&request)?;
    println!(
        "   page {}/{} of {} listings",
        result.page, result.total_pages, result.total
    );
    for item in &result.list_items {
        println!("     {} {:>10.0} {}", item.id, item.price, item.currency);
    }
    println!();

    // === GEOJSON ===
    println!("4. GeoJSON for the map surface");
    println!("------------------------------");
    let collection = geojson::map_data_to_feature_collection(&result);
    println!("   {} features", collection.features.len());

    println!("\n=== Getting Started Complete! ===");
    Ok(())
}
