//! Server options and engine configuration loading.

use anyhow::Context;
use std::path::Path;
use std::time::Duration;
use tilescope::Config;

/// Runtime options shared by every transport.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Capacity of the queue between handlers and the background writer.
    pub write_buffer: usize,
    /// Interval of the aggregate refresher; `None` disables it.
    pub refresh_interval: Option<Duration>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            write_buffer: 1024,
            refresh_interval: None,
        }
    }
}

impl ServerOptions {
    pub fn with_refresh_interval(mut self, every: Duration) -> Self {
        self.refresh_interval = Some(every);
        self
    }
}

/// Load an engine configuration file; `.toml` files are parsed as TOML,
/// anything else as JSON.
pub fn load_engine_config(path: &Path) -> anyhow::Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Config::from_toml(&text)
            .with_context(|| format!("Invalid TOML config {}", path.display()))?,
        _ => Config::from_json(&text)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_toml_and_json() {
        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "max_clusters = 12").unwrap();
        assert_eq!(load_engine_config(toml_file.path()).unwrap().max_clusters, 12);

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(json_file, r#"{{"individual_zoom": 14.0}}"#).unwrap();
        assert_eq!(load_engine_config(json_file.path()).unwrap().individual_zoom, 14.0);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"levels": [7]}}"#).unwrap();
        assert!(load_engine_config(file.path()).is_err());
        assert!(load_engine_config(Path::new("/nonexistent/tilescope.toml")).is_err());
    }
}
