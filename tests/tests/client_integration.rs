use std::sync::Arc;
use std::time::Duration;
use tilescope::{
    Bounds, DisplayMode, Engine, Filters, Listing, ListingType, SearchRequest, Viewport,
};
use tilescope_client::{
    CoordinatorConfig, LocalBackend, MapSession, StoreSnapshot, TilescopeClient,
};
use tilescope_server::run_server;
use tokio::sync::watch;

fn porto_and_lisbon() -> Vec<Listing> {
    let mut listings = Vec::new();
    for i in 0..40 {
        let (city, lat, lng) = if i % 2 == 0 {
            ("lx", 38.72, -9.14)
        } else {
            ("op", 41.15, -8.61)
        };
        listings.push(
            Listing::new(
                format!("{}-{}", city, i),
                lat + (i as f64) * 0.001,
                lng + (i as f64) * 0.001,
                150_000.0 + (i as f64) * 5_000.0,
                if i % 4 < 2 { ListingType::Sale } else { ListingType::Rent },
                "apartment",
            )
            .listed_at(1_700_000_000 + i as u64),
        );
    }
    listings
}

fn portugal() -> Viewport {
    Viewport::from_bounds(Bounds::new(42.2, 36.9, -6.1, -9.6), 6.0)
}

fn lisbon() -> Viewport {
    Viewport::from_bounds(Bounds::new(38.80, 38.65, -9.05, -9.20), 16.0)
}

async fn spawn_test_server(engine: Arc<Engine>) -> anyhow::Result<std::net::SocketAddr> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tilescope_server=info,tilescope=info,info".into()),
        )
        .try_init()
        .ok();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let bound_addr = listener.local_addr()?;

    // Spawn server in background
    tokio::spawn(async move {
        let _ = run_server(listener, engine, futures::future::pending()).await;
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    Ok(bound_addr)
}

async fn wait_for(
    rx: &mut watch::Receiver<Arc<StoreSnapshot>>,
    pred: impl Fn(&StoreSnapshot) -> bool,
) -> anyhow::Result<Arc<StoreSnapshot>> {
    let wait = async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if pred(&snapshot) {
                return Ok(snapshot);
            }
            rx.changed().await?;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait).await?
}

fn fast() -> CoordinatorConfig {
    CoordinatorConfig::default().with_debounce(Duration::from_millis(20))
}

#[tokio::test]
async fn test_session_over_rpc() -> anyhow::Result<()> {
    let engine = Arc::new(Engine::with_listings(
        Default::default(),
        porto_and_lisbon(),
    )?);
    let addr = spawn_test_server(engine).await?;
    let client = TilescopeClient::connect(addr).await?;

    let session = MapSession::spawn(client, fast());
    let mut rx = session.subscribe();

    session.viewport_settled(portugal()).await?;
    let snapshot = wait_for(&mut rx, |s| s.committed_seq >= 1).await?;
    assert_eq!(snapshot.mode(), Some(DisplayMode::Clusters));
    assert_eq!(snapshot.total(), 40);
    assert_eq!(snapshot.total_pages(), 2);
    assert_eq!(snapshot.list_items().len(), 20);

    let result = snapshot.result.as_ref().unwrap();
    assert_eq!(result.map_count(), 40);

    // Zoom into Lisbon: individual markers, list and map agree.
    session.viewport_settled(lisbon()).await?;
    let snapshot = wait_for(&mut rx, |s| s.committed_seq >= 2).await?;
    assert_eq!(snapshot.mode(), Some(DisplayMode::IndividualItems));
    assert_eq!(snapshot.total(), 20);
    assert!(snapshot.list_items().iter().all(|i| i.id.starts_with("lx-")));

    session.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_session_filters_and_paging() -> anyhow::Result<()> {
    let engine = Arc::new(Engine::with_listings(
        Default::default(),
        porto_and_lisbon(),
    )?);
    let session = MapSession::spawn(LocalBackend::new(engine), fast());
    let mut rx = session.subscribe();

    session.viewport_settled(portugal()).await?;
    wait_for(&mut rx, |s| s.committed_seq >= 1).await?;

    session.page_requested(2).await?;
    let snapshot = wait_for(&mut rx, |s| s.committed_seq >= 2).await?;
    assert_eq!(snapshot.page, 2);
    assert_eq!(snapshot.list_items().len(), 20);

    // Newest first: page 2 holds the 20 oldest listings.
    let newest_on_page_two = snapshot.list_items()[0].id.clone();
    assert_eq!(newest_on_page_two, "op-19");

    session
        .filters_changed(Filters::new().with_listing_type(ListingType::Rent))
        .await?;
    let snapshot = wait_for(&mut rx, |s| s.committed_seq >= 3).await?;
    assert_eq!(snapshot.page, 1);
    assert_eq!(snapshot.total(), 20);
    assert!(
        snapshot
            .list_items()
            .iter()
            .all(|i| i.listing_type == ListingType::Rent)
    );

    session.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_invalid_filter_surfaces_persistent_error() -> anyhow::Result<()> {
    let engine = Arc::new(Engine::with_listings(
        Default::default(),
        porto_and_lisbon(),
    )?);
    let session = MapSession::spawn(LocalBackend::new(engine), fast());
    let mut rx = session.subscribe();

    session.viewport_settled(portugal()).await?;
    wait_for(&mut rx, |s| s.committed_seq >= 1).await?;

    session
        .filters_changed(Filters::new().with_min_bathrooms(-2.0))
        .await?;
    let snapshot = wait_for(&mut rx, |s| s.error.is_some()).await?;
    let error = snapshot.error.as_ref().unwrap();
    assert!(error.persistent);
    // Previous data remains visible.
    assert_eq!(snapshot.total(), 40);

    session.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_closed_engine_reports_unavailable() -> anyhow::Result<()> {
    let engine = Arc::new(Engine::with_listings(
        Default::default(),
        porto_and_lisbon(),
    )?);
    let addr = spawn_test_server(engine.clone()).await?;
    let client = TilescopeClient::connect(addr).await?;

    engine.close();
    let err = client
        .search(SearchRequest::new(portugal(), Filters::new()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.into_search_error(),
        tilescope::SearchError::IndexUnavailable(_)
    ));
    Ok(())
}
