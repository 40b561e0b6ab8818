//! GeoJSON export of map data and index nodes.

use crate::error::{Result, TilescopeError};
use geojson::{Feature, FeatureCollection, Geometry, Value, feature::Id};
use serde_json::{Map, json};
use tilescope_types::listing::ListItem;
use tilescope_types::node::SpatialIndexNode;
use tilescope_types::result::{Cluster, MapData, SearchResult};

fn point(lat: f64, lng: f64) -> Option<Geometry> {
    Some(Geometry::new(Value::Point(vec![lng, lat])))
}

fn feature(id: &str, geometry: Option<Geometry>, properties: Map<String, serde_json::Value>) -> Feature {
    Feature {
        bbox: None,
        geometry,
        id: Some(Id::String(id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn cluster_feature(cluster: &Cluster) -> Feature {
    let mut props = Map::new();
    props.insert("kind".into(), json!("cluster"));
    props.insert("count".into(), json!(cluster.count));
    if let Some(avg) = cluster.avg_price {
        props.insert("avg_price".into(), json!(avg));
    }
    if let Some(b) = cluster.bounds {
        props.insert("bounds".into(), json!([b.west, b.south, b.east, b.north]));
    }
    feature(&cluster.id, point(cluster.lat, cluster.lng), props)
}

fn item_feature(item: &ListItem) -> Feature {
    let mut props = Map::new();
    props.insert("kind".into(), json!("listing"));
    props.insert("price".into(), json!(item.price));
    props.insert("currency".into(), json!(item.currency));
    props.insert("listing_type".into(), json!(item.listing_type.as_str()));
    props.insert("property_type".into(), json!(item.property_type));
    props.insert("title".into(), json!(item.title));
    props.insert("bedrooms".into(), json!(item.bedrooms));
    props.insert("bathrooms".into(), json!(item.bathrooms));
    feature(&item.id, point(item.lat, item.lng), props)
}

/// Converts the map half of a search result to a GeoJSON FeatureCollection.
///
/// Clusters and listings become Point features; the collection carries the
/// search total and display mode as foreign members.
pub fn map_data_to_feature_collection(result: &SearchResult) -> FeatureCollection {
    let features = match &result.map_data {
        MapData::Clusters(clusters) => clusters.iter().map(cluster_feature).collect(),
        MapData::Items(items) => items.iter().map(item_feature).collect(),
    };

    let mut foreign = Map::new();
    foreign.insert("total".into(), json!(result.total));
    foreign.insert("mode".into(), json!(result.mode));

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign),
    }
}

/// Serializes the map half of a search result to a GeoJSON string.
pub fn map_data_to_geojson(result: &SearchResult) -> Result<String> {
    serde_json::to_string(&map_data_to_feature_collection(result)).map_err(TilescopeError::from)
}

/// Converts an index node to a Polygon feature of its cell.
pub fn node_to_feature(node: &SpatialIndexNode) -> Feature {
    let b = node.bounds;
    let ring = vec![
        vec![b.west, b.south],
        vec![b.east, b.south],
        vec![b.east, b.north],
        vec![b.west, b.north],
        vec![b.west, b.south],
    ];
    let mut props = Map::new();
    props.insert("level".into(), json!(node.level));
    props.insert("total_count".into(), json!(node.total_count));
    props.insert("avg_price".into(), json!(node.avg_price));
    props.insert("subcategories".into(), json!(node.counts_by_subcategory()));

    feature(&node.id, Some(Geometry::new(Value::Polygon(vec![ring]))), props)
}
