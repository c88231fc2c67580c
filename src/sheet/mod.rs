//! Spreadsheet loading: export-URL derivation, HTTP fetch, and a TTL store.
//!
//! The shared spreadsheet is read through its CSV export endpoint. Loaded
//! tables are considered fresh for a configurable interval (10 minutes by
//! default); after expiry the next read triggers a new fetch.

mod fetch;
mod store;

pub use fetch::{HttpSheetFetcher, SheetFetch};
pub use store::{LastUpdated, SheetStore, StoreStatus};

use thiserror::Error;
use url::Url;

/// Errors from the data loader.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("invalid sheet URL: {0}")]
    InvalidUrl(String),

    #[error("fetch failed: {0}")]
    Network(String),

    #[error("sheet host returned HTTP {0}")]
    Status(u16),

    #[error("CSV parse failed: {0}")]
    Parse(String),
}

/// A shared spreadsheet identified by its share link.
///
/// The CSV export URL is derived from the link by replacing the `/edit…`
/// suffix with `/export?format=csv`; a per-tab variant appends `&gid=<gid>`
/// and is used to read the "last updated" timestamp cell.
#[derive(Debug, Clone)]
pub struct SheetSource {
    base: String,
}

impl SheetSource {
    pub fn from_share_url(share_url: &str) -> Result<Self, SheetError> {
        let parsed =
            Url::parse(share_url).map_err(|e| SheetError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SheetError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let trimmed = share_url.trim_end_matches('/');
        let base = match trimmed.find("/edit") {
            Some(idx) => trimmed[..idx].to_string(),
            None => trimmed.to_string(),
        };
        Ok(Self { base })
    }

    /// Export URL for the default tab.
    pub fn export_url(&self) -> String {
        format!("{}/export?format=csv", self.base)
    }

    /// Export URL for a specific tab by numeric gid.
    pub fn export_url_for_gid(&self, gid: u64) -> String {
        format!("{}/export?format=csv&gid={}", self.base, gid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_link_becomes_export_url() {
        let src = SheetSource::from_share_url(
            "https://docs.google.com/spreadsheets/d/abc123/edit?usp=sharing",
        )
        .unwrap();
        assert_eq!(
            src.export_url(),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv"
        );
    }

    #[test]
    fn gid_variant_targets_one_tab() {
        let src = SheetSource::from_share_url(
            "https://docs.google.com/spreadsheets/d/abc123/edit?usp=sharing",
        )
        .unwrap();
        assert_eq!(
            src.export_url_for_gid(1733),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv&gid=1733"
        );
    }

    #[test]
    fn link_without_edit_suffix_is_accepted() {
        let src =
            SheetSource::from_share_url("https://docs.google.com/spreadsheets/d/abc123").unwrap();
        assert_eq!(
            src.export_url(),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv"
        );
    }

    #[test]
    fn garbage_urls_are_rejected() {
        assert!(SheetSource::from_share_url("not a url").is_err());
        assert!(SheetSource::from_share_url("ftp://example.com/sheet").is_err());
    }
}
