//! Newline-delimited JSON ingestion.
//!
//! One `Listing` object per line. Blank lines and lines starting with `#`
//! are skipped.

use crate::error::{Result, TilescopeError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tilescope_types::listing::Listing;

/// Parse listings from a reader.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<Listing>> {
    let mut listings = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let listing: Listing = serde_json::from_str(trimmed)
            .map_err(|source| TilescopeError::SerializationAtLine {
                line: idx + 1,
                source,
            })?;
        listings.push(listing);
    }
    Ok(listings)
}

/// Parse listings from a file.
pub fn load_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<Listing>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let listings = read_jsonl(BufReader::new(file))?;
    log::info!("Loaded {} listings from {}", listings.len(), path.display());
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LINES: &str = r#"
# two listings
{"id":"a","lat":38.7,"lng":-9.1,"price":100.0,"listing_type":"sale","property_type":"apartment"}

{"id":"b","lat":41.1,"lng":-8.6,"price":900.0,"listing_type":"rent","property_type":"studio","bedrooms":1,"listed_at":1700000000}
"#;

    #[test]
    fn test_read_jsonl() {
        let listings = read_jsonl(LINES.as_bytes()).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].currency, "EUR");
        assert_eq!(listings[1].bedrooms, 1);
        assert_eq!(listings[1].listed_at, 1_700_000_000);
    }

    #[test]
    fn test_reports_line_number() {
        let input = "{\"id\":\"a\",\"lat\":1.0,\"lng\":1.0,\"price\":1.0,\"listing_type\":\"sale\",\"property_type\":\"x\"}\nnot json\n";
        match read_jsonl(input.as_bytes()) {
            Err(TilescopeError::SerializationAtLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected a line error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_jsonl_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LINES.as_bytes()).unwrap();
        let listings = load_jsonl(file.path()).unwrap();
        assert_eq!(listings.len(), 2);

        assert!(matches!(
            load_jsonl(file.path().with_extension("missing")),
            Err(TilescopeError::Io(_))
        ));
    }
}
