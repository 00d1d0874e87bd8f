//! Catalog snapshot files
//!
//! A snapshot is a JSON array of raw supplier records, as returned by the
//! JLCPCB component API, stored gzip compressed (`.gz`) or as plain JSON.
//! It is loaded once and every group is matched against the full list in
//! file order.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::{parse_entries, CatalogEntry, CatalogError, CatalogQuery, CatalogSource, RawCatalogEntry};

/// Default snapshot file name, looked up in the working directory
pub const DEFAULT_SNAPSHOT_FILE: &str = "jlcdb.json.gz";

/// Whether `path` names a gzip compressed snapshot
pub fn is_compressed(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

fn read_snapshot(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut content = String::new();
    if is_compressed(path) {
        GzDecoder::new(file).read_to_string(&mut content)?;
    } else {
        BufReader::new(file).read_to_string(&mut content)?;
    }
    Ok(content)
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotCatalog {
    path: Option<PathBuf>,
    entries: Vec<CatalogEntry>,
}

impl SnapshotCatalog {
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { path: None, entries }
    }

    /// Load a snapshot file. Unusable records are skipped; an unreadable
    /// file or anything other than a JSON array is an error.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = read_snapshot(path).map_err(|e| {
            CatalogError::Unavailable(format!("cannot read snapshot {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json_str(&content)?;
        tracing::info!(
            "Loaded {} components from {}",
            catalog.entries.len(),
            path.display()
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            ..catalog
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(content)?;
        Ok(Self::from_entries(parse_entries(values)))
    }

    /// Write the entries back in the raw supplier layout, compressed when
    /// `path` ends in `.gz`
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let raw: Vec<RawCatalogEntry> = self.entries.iter().map(RawCatalogEntry::from).collect();
        let file = File::create(path)?;
        if is_compressed(path) {
            let mut encoder = GzEncoder::new(file, Compression::default());
            serde_json::to_writer(&mut encoder, &raw)?;
            encoder.finish()?;
        } else {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &raw)?;
            writer.flush()?;
        }
        tracing::info!("Saved {} components to {}", raw.len(), path.display());
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CatalogSource for SnapshotCatalog {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn candidates(&self, _query: &CatalogQuery<'_>) -> Result<Cow<'_, [CatalogEntry]>, CatalogError> {
        Ok(Cow::Borrowed(&self.entries))
    }
}
