use std::sync::Arc;
use std::time::Duration;
use tilescope::{Bounds, Engine, Filters, Listing, ListingType, SearchRequest, Viewport};
use tilescope_client::{ClientError, CoordinatorConfig, MapSession, TilescopeHttpClient};
use tilescope_server::{ServerOptions, spawn_services};
use tilescope_types::error::SearchError;

async fn spawn_http_server() -> anyhow::Result<String> {
    let engine = Arc::new(Engine::builder().listings(vec![
        Listing::new("b-1", 41.39, 2.17, 250_000.0, ListingType::Sale, "flat"),
        Listing::new("b-2", 41.40, 2.16, 1_100.0, ListingType::Rent, "flat"),
        Listing::new("b-3", 41.38, 2.18, 900.0, ListingType::Rent, "room"),
    ])
    .build()?);
    let handler = spawn_services(engine, &ServerOptions::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let bound_addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = tilescope_server::transport::http::serve(
            listener,
            handler,
            futures::future::pending(),
        )
        .await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    Ok(format!("http://{}", bound_addr))
}

fn barcelona() -> Viewport {
    Viewport::from_bounds(Bounds::new(41.45, 41.35, 2.25, 2.10), 12.0)
}

#[tokio::test]
async fn test_http_search_and_stats() -> anyhow::Result<()> {
    let base_url = spawn_http_server().await?;
    let client = TilescopeHttpClient::new(&base_url)?;

    let rent = Filters::new().with_listing_type(ListingType::Rent);
    let result = client
        .search(&SearchRequest::new(barcelona(), rent))
        .await?;
    assert_eq!(result.total, 2);
    assert_eq!(result.map_count(), 2);

    let stats = client.stats().await?;
    assert_eq!(stats.listing_count, 3);
    assert!(stats.is_fresh());

    Ok(())
}

#[tokio::test]
async fn test_http_search_error_round_trips() -> anyhow::Result<()> {
    let base_url = spawn_http_server().await?;
    let client = TilescopeHttpClient::new(&base_url)?;

    let inverted = Viewport::from_bounds(Bounds::new(41.35, 41.45, 2.25, 2.10), 12.0);
    let err = client
        .search(&SearchRequest::new(inverted, Filters::new()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Search(SearchError::InvalidViewport(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_session_over_http() -> anyhow::Result<()> {
    let base_url = spawn_http_server().await?;
    let client = TilescopeHttpClient::new(&base_url)?;
    let session = MapSession::spawn(
        client,
        CoordinatorConfig::default().with_debounce(Duration::from_millis(10)),
    );
    let mut rx = session.subscribe();

    session.viewport_settled(barcelona()).await?;
    let snapshot = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.has_data() {
                return snapshot;
            }
            if rx.changed().await.is_err() {
                return snapshot;
            }
        }
    })
    .await?;
    assert_eq!(snapshot.total(), 3);

    session.shutdown().await;
    Ok(())
}
