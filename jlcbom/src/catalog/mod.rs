//! Supplier parts catalog
//!
//! The matcher never talks to the network or the filesystem directly; it
//! asks a [`CatalogSource`] for candidate entries per group:
//!
//! - [`SnapshotCatalog`]: a JSON file loaded once, same entries for every group
//! - [`LiveCatalog`]: one keyword query against the JLCPCB search API per group
//!
//! Both read the supplier's raw record format and skip records that lack
//! the fields matching relies on.

pub mod client;
pub mod snapshot;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grouping::NormalizedIdentity;
use crate::normalize::PartKind;

pub use client::LiveCatalog;
pub use snapshot::SnapshotCatalog;

/// Errors while acquiring catalog data. All of them abort the run.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Catalog API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A supplier record that cannot be used. Such records are skipped.
#[derive(Debug, Error, PartialEq)]
pub enum MalformedCatalogEntry {
    #[error("catalog entry {code}: missing field '{field}'")]
    MissingField { code: String, field: &'static str },
    #[error("catalog entry is not a valid record: {0}")]
    Invalid(String),
}

/// Stocking class of a catalog part. `Basic` parts carry no extra setup fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LibraryTier {
    Extended,
    Basic,
}

impl LibraryTier {
    /// Label used in the supplier data and in the BOM `Type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryTier::Basic => "base",
            LibraryTier::Extended => "extended",
        }
    }

    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("base") {
            LibraryTier::Basic
        } else {
            LibraryTier::Extended
        }
    }
}

/// One supplier part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub part_code: String,
    pub description: String,
    pub library_tier: LibraryTier,
    /// Package as the supplier names it, e.g. `0603`
    pub specification: String,
    pub model_name: String,
    pub stock_count: u64,
}

/// Record layout used by the JLCPCB component API and by snapshot files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalogEntry {
    pub component_code: Option<String>,
    pub describe: Option<String>,
    pub component_library_type: Option<String>,
    pub component_specification_en: Option<String>,
    pub component_model_en: Option<String>,
    pub stock_count: Option<u64>,
}

impl TryFrom<RawCatalogEntry> for CatalogEntry {
    type Error = MalformedCatalogEntry;

    fn try_from(raw: RawCatalogEntry) -> Result<Self, Self::Error> {
        let part_code = raw
            .component_code
            .filter(|c| !c.trim().is_empty())
            .ok_or(MalformedCatalogEntry::MissingField {
                code: "?".to_string(),
                field: "componentCode",
            })?;
        let missing = |field| MalformedCatalogEntry::MissingField {
            code: part_code.clone(),
            field,
        };

        let description = raw.describe.ok_or_else(|| missing("describe"))?;
        let library_tier = raw
            .component_library_type
            .map(|t| LibraryTier::from_label(&t))
            .ok_or_else(|| missing("componentLibraryType"))?;
        let stock_count = raw.stock_count.ok_or_else(|| missing("stockCount"))?;

        Ok(CatalogEntry {
            part_code: part_code.trim().to_string(),
            description,
            library_tier,
            specification: raw.component_specification_en.unwrap_or_default(),
            model_name: raw.component_model_en.unwrap_or_default(),
            stock_count,
        })
    }
}

impl From<&CatalogEntry> for RawCatalogEntry {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            component_code: Some(entry.part_code.clone()),
            describe: Some(entry.description.clone()),
            component_library_type: Some(entry.library_tier.as_str().to_string()),
            component_specification_en: Some(entry.specification.clone()),
            component_model_en: Some(entry.model_name.clone()),
            stock_count: Some(entry.stock_count),
        }
    }
}

impl CatalogEntry {
    pub fn from_value(value: serde_json::Value) -> Result<Self, MalformedCatalogEntry> {
        let raw: RawCatalogEntry = serde_json::from_value(value)
            .map_err(|e| MalformedCatalogEntry::Invalid(e.to_string()))?;
        raw.try_into()
    }
}

/// Convert raw supplier records, skipping (and logging) unusable ones
pub fn parse_entries(values: Vec<serde_json::Value>) -> Vec<CatalogEntry> {
    let total = values.len();
    let entries: Vec<CatalogEntry> = values
        .into_iter()
        .filter_map(|v| match CatalogEntry::from_value(v) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping {}", e);
                None
            }
        })
        .collect();
    if entries.len() < total {
        tracing::warn!("Skipped {} malformed catalog entries", total - entries.len());
    }
    entries
}

/// What the matcher is looking for
#[derive(Debug, Clone, Copy)]
pub struct CatalogQuery<'a> {
    pub identity: &'a NormalizedIdentity,
    pub kind: Option<PartKind>,
}

impl CatalogQuery<'_> {
    /// Search keyword: the part number if known, otherwise package, kind
    /// and value joined by spaces. Empty when nothing is known.
    pub fn keyword(&self) -> String {
        if let Some(pn) = &self.identity.part_number {
            return pn.trim().to_string();
        }
        [
            self.identity.package.as_str(),
            self.kind.map_or("", |k| k.as_str()),
            self.identity.value.as_str(),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Provider of candidate entries for a group
pub trait CatalogSource {
    /// Short label for logs
    fn name(&self) -> &str;

    /// Entries to consider for `query`, in supplier order
    fn candidates(&self, query: &CatalogQuery<'_>) -> Result<Cow<'_, [CatalogEntry]>, CatalogError>;
}
