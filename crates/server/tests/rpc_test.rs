use std::net::SocketAddr;
use std::sync::Arc;
use tilescope::{Bounds, Engine, Filters, Listing, ListingType, SearchRequest, Viewport};
use tilescope_client::{ClientError, TilescopeClient};
use tilescope_server::run_server;
use tilescope_types::error::SearchError;

fn lisbon() -> Vec<Listing> {
    (0..10)
        .map(|i| {
            Listing::new(
                format!("lx-{}", i),
                38.70 + i as f64 * 0.005,
                -9.15 + i as f64 * 0.005,
                200_000.0 + i as f64 * 10_000.0,
                if i % 2 == 0 { ListingType::Sale } else { ListingType::Rent },
                "apartment",
            )
        })
        .collect()
}

async fn start(engine: Engine) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let bound_addr = listener.local_addr()?;

    let engine = Arc::new(engine);
    tokio::spawn(async move {
        let _ = run_server(listener, engine, futures::future::pending()).await;
    });

    // Wait for server to start
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    Ok(bound_addr)
}

fn lisbon_viewport(zoom: f64) -> Viewport {
    Viewport::from_bounds(Bounds::new(38.80, 38.65, -9.05, -9.20), zoom)
}

#[tokio::test]
async fn test_rpc_search() -> anyhow::Result<()> {
    tracing_subscriber::fmt::try_init().ok();
    let addr = start(Engine::builder().listings(lisbon()).build()?).await?;
    let client = TilescopeClient::connect(addr).await?;

    let result = client
        .search(SearchRequest::new(lisbon_viewport(10.0), Filters::new()).page(1, 4))
        .await?;
    assert_eq!(result.total, 10);
    assert_eq!(result.total_pages, 3);
    assert_eq!(result.list_items.len(), 4);
    assert_eq!(result.map_count(), 10);

    let sales = Filters::new().with_listing_type(ListingType::Sale);
    let result = client
        .search(SearchRequest::new(lisbon_viewport(16.0), sales))
        .await?;
    assert_eq!(result.total, 5);
    assert_eq!(result.items().map(|i| i.len()), Some(5));

    Ok(())
}

#[tokio::test]
async fn test_rpc_search_errors_cross_the_wire() -> anyhow::Result<()> {
    tracing_subscriber::fmt::try_init().ok();
    let addr = start(Engine::builder().listings(lisbon()).build()?).await?;
    let client = TilescopeClient::connect(addr).await?;

    let inverted = Viewport::from_bounds(Bounds::new(38.0, 39.0, -9.0, -10.0), 10.0);
    let err = client
        .search(SearchRequest::new(inverted, Filters::new()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Search(SearchError::InvalidViewport(_))
    ));

    let negative = Filters::new().with_price_range(Some(-1.0), None);
    let err = client
        .search(SearchRequest::new(lisbon_viewport(10.0), negative))
        .await
        .unwrap_err();
    assert!(matches!(
        err.into_search_error(),
        SearchError::InvalidFilter(_)
    ));

    Ok(())
}

#[tokio::test]
async fn test_rpc_write_lifecycle() -> anyhow::Result<()> {
    tracing_subscriber::fmt::try_init().ok();
    let addr = start(Engine::builder().listings(lisbon()).build()?).await?;
    let client = TilescopeClient::connect(addr).await?;

    client
        .upsert_listing(Listing::new(
            "lx-new",
            38.75,
            -9.10,
            500_000.0,
            ListingType::Sale,
            "house",
        ))
        .await?;
    client.remove_listing("lx-0").await?;

    // Rebuild is queued behind the writes above.
    let stats = client.rebuild_index().await?;
    assert_eq!(stats.listing_count, 10);
    assert!(stats.is_fresh());

    assert!(client.get_listing("lx-new").await?.is_some());
    assert!(client.get_listing("lx-0").await?.is_none());

    let result = client
        .search(SearchRequest::new(lisbon_viewport(10.0), Filters::new()))
        .await?;
    assert_eq!(result.total, 10);

    let stats = client.stats().await?;
    assert_eq!(stats.listing_count, 10);

    Ok(())
}

#[tokio::test]
async fn test_rpc_rejects_invalid_listing() -> anyhow::Result<()> {
    tracing_subscriber::fmt::try_init().ok();
    let addr = start(Engine::builder().build()?).await?;
    let client = TilescopeClient::connect(addr).await?;

    let err = client
        .upsert_listing(Listing::new(
            "bad",
            100.0,
            0.0,
            1.0,
            ListingType::Sale,
            "house",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Server(msg) if msg.contains("bad")));

    let err = client
        .upsert_listing(Listing::new(
            "cheap",
            10.0,
            10.0,
            -5.0,
            ListingType::Sale,
            "house",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Server(_)));
    assert_eq!(client.stats().await?.listing_count, 0);

    Ok(())
}
