//! Engine builder
//!
//! Collects configuration and initial listings, then builds the engine and
//! its first aggregate snapshot in one step.

use crate::config::Config;
use crate::engine::{Engine, ingest};
use crate::error::Result;
use std::path::PathBuf;
use tilescope_types::listing::Listing;

/// Builder for an [`Engine`] with initial data.
#[derive(Debug, Default)]
pub struct EngineBuilder {
    config: Config,
    listings: Vec<Listing>,
    files: Vec<PathBuf>,
}

impl EngineBuilder {
    /// Create a new builder with the default configuration and no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Add listings to ingest on build.
    pub fn listings(mut self, listings: impl IntoIterator<Item = Listing>) -> Self {
        self.listings.extend(listings);
        self
    }

    /// Add a newline-delimited JSON file to ingest on build.
    pub fn listings_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.files.push(path.into());
        self
    }

    /// Build the engine. Files are read after in-memory listings, so a file
    /// entry replaces an in-memory listing with the same id.
    pub fn build(self) -> Result<Engine> {
        let mut listings = self.listings;
        for path in &self.files {
            listings.extend(ingest::load_jsonl(path)?);
        }
        Engine::with_listings(self.config, listings)
    }
}
