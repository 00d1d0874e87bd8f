//! Catalog matching
//!
//! Each group is resolved in two tiers:
//!
//! 1. **Exact code**: the group's part number equals an entry's part code.
//! 2. **Heuristic**: kind, package and value must all be found in the
//!    entry's description (or specification / model name). Among the
//!    qualifying entries `Basic` parts beat `Extended` ones, earlier entries
//!    beat later ones.
//!
//! Strict mode stops after tier 1. Groups that stay unmatched are returned
//! as missing so they can be sourced by hand.

use serde::Serialize;

use crate::catalog::{CatalogEntry, CatalogError, CatalogQuery, CatalogSource, LibraryTier};
use crate::grouping::{ComponentGroup, NormalizedIdentity};

/// Which tier produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchTier {
    ExactCode,
    Heuristic,
}

/// Catalog part chosen for a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedPart {
    pub part_code: String,
    pub description: String,
    pub library_tier: LibraryTier,
    pub specification: String,
    pub model_name: String,
    pub matched_by: MatchTier,
}

impl MatchedPart {
    fn from_entry(entry: &CatalogEntry, matched_by: MatchTier) -> Self {
        Self {
            part_code: entry.part_code.clone(),
            description: entry.description.clone(),
            library_tier: entry.library_tier,
            specification: entry.specification.clone(),
            model_name: entry.model_name.clone(),
            matched_by,
        }
    }
}

/// Outcome of matching one group. Starts empty and is filled at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResult {
    part: Option<MatchedPart>,
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        self.part.is_some()
    }

    pub fn part(&self) -> Option<&MatchedPart> {
        self.part.as_ref()
    }

    /// Record a match unless one is already recorded
    fn record(&mut self, part: MatchedPart) {
        if self.part.is_none() {
            self.part = Some(part);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Only accept exact part number matches
    pub strict: bool,
    /// Accept parts even when stock does not cover the group
    pub ignore_stock: bool,
}

/// Summary of a matching pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchReport {
    pub matched: usize,
    /// Identities left unmatched, in group order
    pub missing: Vec<NormalizedIdentity>,
}

pub struct Matcher {
    options: MatchOptions,
}

impl Matcher {
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    /// Match every group in creation order, querying `source` per group.
    ///
    /// Groups that already hold a match are left as they are. A catalog
    /// failure aborts the pass.
    pub fn match_groups(
        &self,
        groups: &mut [ComponentGroup],
        source: &dyn CatalogSource,
    ) -> Result<MatchReport, CatalogError> {
        let mut report = MatchReport::default();

        for group in groups.iter_mut() {
            if !group.result.is_matched() {
                if let Some(part) = self.resolve(group, source)? {
                    group.result.record(part);
                }
            }

            match group.result.part() {
                Some(part) => {
                    tracing::debug!(
                        "{:?} -> {} ({}, {:?})",
                        group.designators(),
                        part.part_code,
                        part.library_tier.as_str(),
                        part.matched_by
                    );
                    report.matched += 1;
                }
                None => {
                    tracing::debug!("{:?} -> no match", group.designators());
                    report.missing.push(group.identity.clone());
                }
            }
        }

        tracing::info!(
            "Matched {} of {} groups using {} catalog",
            report.matched,
            groups.len(),
            source.name()
        );
        Ok(report)
    }

    fn resolve(
        &self,
        group: &ComponentGroup,
        source: &dyn CatalogSource,
    ) -> Result<Option<MatchedPart>, CatalogError> {
        // Nothing to look up in strict mode without a part number
        if self.options.strict && group.identity.part_number.is_none() {
            return Ok(None);
        }
        let query = CatalogQuery {
            identity: &group.identity,
            kind: group.kind,
        };
        let entries = source.candidates(&query)?;
        Ok(self.match_group(group, &entries))
    }

    /// Pick the catalog entry for one group from `entries`
    pub fn match_group(&self, group: &ComponentGroup, entries: &[CatalogEntry]) -> Option<MatchedPart> {
        if let Some(pn) = &group.identity.part_number {
            if let Some(entry) = entries.iter().find(|e| e.part_code.eq_ignore_ascii_case(pn)) {
                return Some(MatchedPart::from_entry(entry, MatchTier::ExactCode));
            }
        }
        if self.options.strict {
            return None;
        }

        best_candidate(entries.iter().filter(|e| self.qualifies(group, e)))
            .map(|entry| MatchedPart::from_entry(entry, MatchTier::Heuristic))
    }

    /// Heuristic tier test for a single entry
    pub fn qualifies(&self, group: &ComponentGroup, entry: &CatalogEntry) -> bool {
        if !self.options.ignore_stock && entry.stock_count < group.len() as u64 {
            return false;
        }

        let description = entry.description.to_uppercase();

        if let Some(kind) = group.kind {
            if !description.contains(kind.as_str()) {
                return false;
            }
        }

        let package = &group.identity.package;
        if !package.is_empty()
            && !description.contains(package.as_str())
            && entry.specification.trim().to_uppercase() != *package
        {
            return false;
        }

        let value = &group.identity.value;
        let all_words_found = value.split_whitespace().all(|word| description.contains(word));
        all_words_found || entry.model_name.to_uppercase().contains(value.as_str())
    }
}

/// Best entry by tier (`Basic` first), then by position.
///
/// Nothing ranks above `Basic`, so the scan ends at the first one.
fn best_candidate<'a>(candidates: impl IntoIterator<Item = &'a CatalogEntry>) -> Option<&'a CatalogEntry> {
    let mut best: Option<&CatalogEntry> = None;
    for candidate in candidates {
        if best.map_or(true, |b| candidate.library_tier > b.library_tier) {
            best = Some(candidate);
        }
        if candidate.library_tier == LibraryTier::Basic {
            break;
        }
    }
    best
}
