//! TTL store in front of the sheet fetcher.
//!
//! Freshness model: a loaded table is served as-is until the TTL elapses; the
//! next read after expiry triggers a re-fetch. A failed re-fetch degrades to
//! the stale copy when one exists instead of discarding data the user has
//! already seen.

use super::{SheetError, SheetFetch, SheetSource};
use crate::table::{parse_csv, Table};
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

struct CachedTable {
    table: Arc<Table>,
    fetched_at: Instant,
}

/// Snapshot of the store's freshness for the status surface.
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub loaded: bool,
    pub age: Option<Duration>,
    pub fresh: bool,
    pub revision: u64,
}

/// "Last updated" cell read from a dedicated timestamp tab.
#[derive(Debug, Clone)]
pub struct LastUpdated {
    pub raw: String,
    pub parsed: Option<NaiveDateTime>,
}

pub struct SheetStore {
    source: SheetSource,
    fetcher: Arc<dyn SheetFetch>,
    ttl: Duration,
    timestamp_gid: Option<u64>,
    entry: RwLock<Option<CachedTable>>,
    revision: AtomicU64,
}

impl SheetStore {
    pub fn new(
        source: SheetSource,
        fetcher: Arc<dyn SheetFetch>,
        ttl: Duration,
        timestamp_gid: Option<u64>,
    ) -> Self {
        Self {
            source,
            fetcher,
            ttl,
            timestamp_gid,
            entry: RwLock::new(None),
            revision: AtomicU64::new(0),
        }
    }

    /// The current table, re-fetching when the cached copy has expired.
    pub async fn table(&self) -> Result<Arc<Table>, SheetError> {
        if let Some(table) = self.fresh_entry() {
            return Ok(table);
        }

        match self.fetch_table().await {
            Ok(table) => {
                let table = Arc::new(table);
                *self.entry.write().unwrap() = Some(CachedTable {
                    table: Arc::clone(&table),
                    fetched_at: Instant::now(),
                });
                self.revision.fetch_add(1, Ordering::Relaxed);
                debug!(rows = table.row_count(), "sheet loaded");
                Ok(table)
            }
            Err(e) => {
                // Degrade to the stale copy when one exists.
                if let Some(stale) = self.any_entry() {
                    warn!(error = %e, "sheet refresh failed, serving stale copy");
                    return Ok(stale);
                }
                Err(e)
            }
        }
    }

    /// Drop the cached copy so the next read fetches fresh content.
    pub fn invalidate(&self) {
        *self.entry.write().unwrap() = None;
    }

    pub fn status(&self) -> StoreStatus {
        let entry = self.entry.read().unwrap();
        let age = entry.as_ref().map(|e| e.fetched_at.elapsed());
        StoreStatus {
            loaded: entry.is_some(),
            fresh: age.map(|a| a <= self.ttl).unwrap_or(false),
            age,
            revision: self.revision.load(Ordering::Relaxed),
        }
    }

    /// Read the first cell of the timestamp tab, when one is configured.
    pub async fn last_updated(&self) -> Result<Option<LastUpdated>, SheetError> {
        let Some(gid) = self.timestamp_gid else {
            return Ok(None);
        };
        let url = self.source.export_url_for_gid(gid);
        let bytes = self.fetcher.fetch_csv(&url).await?;
        let text = String::from_utf8_lossy(&bytes);
        let raw = first_cell(&text).unwrap_or_default();
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(LastUpdated {
            parsed: parse_timestamp(&raw),
            raw,
        }))
    }

    fn fresh_entry(&self) -> Option<Arc<Table>> {
        let entry = self.entry.read().unwrap();
        entry
            .as_ref()
            .filter(|e| e.fetched_at.elapsed() <= self.ttl)
            .map(|e| Arc::clone(&e.table))
    }

    fn any_entry(&self) -> Option<Arc<Table>> {
        let entry = self.entry.read().unwrap();
        entry.as_ref().map(|e| Arc::clone(&e.table))
    }

    async fn fetch_table(&self) -> Result<Table, SheetError> {
        let bytes = self.fetcher.fetch_csv(&self.source.export_url()).await?;
        parse_csv(&bytes)
    }
}

fn first_cell(text: &str) -> Option<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    reader
        .records()
        .next()
        .and_then(|r| r.ok())
        .and_then(|r| r.get(0).map(|c| c.trim().to_string()))
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y.%m.%d %H:%M:%S",
        "%Y.%m.%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    for fmt in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
