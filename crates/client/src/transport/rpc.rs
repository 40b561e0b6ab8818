//! tarpc transport for tilescope client
//!
//! This is the default RPC client.

use crate::backend::SearchBackend;
use crate::error::{ClientError, Result};
use std::net::SocketAddr;
use std::time::{Duration, SystemTime};
use tarpc::client;
use tarpc::context;
use tarpc::tokio_serde::formats::Json;
use tilescope_server::TilescopeServiceClient;
use tilescope_types::listing::Listing;
use tilescope_types::result::{SearchRequest, SearchResult};
use tilescope_types::stats::IndexStats;

#[derive(Clone)]
pub struct TilescopeClient {
    client: TilescopeServiceClient,
    deadline: Option<Duration>,
}

impl TilescopeClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let transport = tarpc::serde_transport::tcp::connect(addr, Json::default).await?;
        let client = TilescopeServiceClient::new(client::Config::default(), transport).spawn();
        Ok(Self {
            client,
            deadline: None,
        })
    }

    /// Per-call deadline enforced by tarpc (defaults to its own 10s).
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn ctx(&self) -> context::Context {
        let mut ctx = context::current();
        if let Some(deadline) = self.deadline {
            ctx.deadline = SystemTime::now() + deadline;
        }
        ctx
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResult> {
        Ok(self.client.search(self.ctx(), request).await??)
    }

    pub async fn upsert_listing(&self, listing: Listing) -> Result<()> {
        self.client
            .upsert_listing(self.ctx(), listing)
            .await?
            .map_err(ClientError::Server)
    }

    pub async fn remove_listing(&self, id: &str) -> Result<()> {
        self.client
            .remove_listing(self.ctx(), id.to_string())
            .await?
            .map_err(ClientError::Server)
    }

    pub async fn get_listing(&self, id: &str) -> Result<Option<Listing>> {
        self.client
            .get_listing(self.ctx(), id.to_string())
            .await?
            .map_err(ClientError::Server)
    }

    pub async fn rebuild_index(&self) -> Result<IndexStats> {
        self.client
            .rebuild_index(self.ctx())
            .await?
            .map_err(ClientError::Server)
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        Ok(self.client.stats(self.ctx()).await?)
    }
}

impl SearchBackend for TilescopeClient {
    async fn search(&self, request: SearchRequest) -> Result<SearchResult> {
        TilescopeClient::search(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tilescope::{Bounds, Engine, Filters, Viewport};

    #[tokio::test]
    async fn test_deadline_applies_to_calls() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let engine = Arc::new(Engine::builder().build().unwrap());
        tokio::spawn(async move {
            let _ =
                tilescope_server::run_server(listener, engine, std::future::pending()).await;
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = TilescopeClient::connect(addr)
            .await
            .unwrap()
            .with_deadline(Duration::from_secs(2));

        let deadline = client.ctx().deadline;
        let remaining = deadline.duration_since(SystemTime::now()).unwrap();
        assert!(remaining <= Duration::from_secs(2));
        assert!(remaining > Duration::from_secs(1));

        let viewport = Viewport::from_bounds(Bounds::new(1.0, -1.0, 1.0, -1.0), 5.0);
        let result = client
            .search(SearchRequest::new(viewport, Filters::new()))
            .await
            .unwrap();
        assert_eq!(result.total, 0);
    }
}
