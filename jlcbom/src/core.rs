//! Assembly pipeline shared by the CLI and library users.
//!
//! board file → placements → groups → catalog matches → BOM/CPL rows

use std::path::{Path, PathBuf};

use crate::catalog::snapshot::DEFAULT_SNAPSHOT_FILE;
use crate::catalog::{CatalogError, CatalogSource, LiveCatalog, SnapshotCatalog};
use crate::grouping::{ComponentGroup, Grouper, GroupingError, GroupingOptions, NormalizedIdentity};
use crate::matcher::{MatchOptions, Matcher};
use crate::parser::eagle::{EagleParseError, EagleParser, DEFAULT_PART_NUMBER_ATTRIBUTE};
use crate::parser::schema::{Board, BoardComponent};
use crate::report::AssemblyReport;

#[derive(Debug, thiserror::Error)]
pub enum JlcBomError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("{0}")]
    Catalog(#[from] CatalogError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Output error: {0}")]
    Output(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EagleParseError> for JlcBomError {
    fn from(e: EagleParseError) -> Self {
        JlcBomError::Parse(e.to_string())
    }
}

impl From<GroupingError> for JlcBomError {
    fn from(e: GroupingError) -> Self {
        JlcBomError::Config(e.to_string())
    }
}

/// Options for an assembly run (CLI or library).
#[derive(Clone, Debug)]
pub struct AssemblyOptions {
    /// Only match on the part number attribute
    pub strict_match: bool,
    /// Select parts even if stock is insufficient
    pub ignore_stock: bool,
    /// Designators to leave out when they have no part number (regex)
    pub ignore_pattern: Option<String>,
    /// Query the supplier per group instead of reading a snapshot
    pub online: bool,
    pub catalog_path: PathBuf,
    /// Element attribute holding the supplier part number
    pub part_number_attribute: String,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            strict_match: false,
            ignore_stock: false,
            ignore_pattern: None,
            online: false,
            catalog_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            part_number_attribute: DEFAULT_PART_NUMBER_ATTRIBUTE.to_string(),
        }
    }
}

impl AssemblyOptions {
    pub fn grouping_options(&self) -> GroupingOptions {
        GroupingOptions {
            ignore_pattern: self.ignore_pattern.clone(),
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            strict: self.strict_match,
            ignore_stock: self.ignore_stock,
        }
    }
}

/// Result of one board run
#[derive(Debug, Clone)]
pub struct AssemblyResult {
    pub file: PathBuf,
    /// Groups in creation order, with their match results
    pub groups: Vec<ComponentGroup>,
    /// Placements left out because they are not on the top side
    pub excluded: Vec<BoardComponent>,
    /// Designators skipped by the ignore pattern
    pub ignored: Vec<String>,
    /// Identities no catalog part was found for
    pub missing: Vec<NormalizedIdentity>,
    pub report: AssemblyReport,
}

impl AssemblyResult {
    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }

    pub fn matched_count(&self) -> usize {
        self.groups.iter().filter(|g| g.result.is_matched()).count()
    }

    pub fn placement_count(&self) -> usize {
        self.report.placements.len()
    }

    /// Write `bom.csv` and `cpl.csv` into `dir`, creating it if needed
    pub fn write_outputs(&self, dir: &Path) -> Result<(PathBuf, PathBuf), JlcBomError> {
        std::fs::create_dir_all(dir)?;
        Ok(self.report.write_files(dir)?)
    }
}

/// Core assembly API used by the CLI.
pub struct AssemblyCore;

impl AssemblyCore {
    /// Open the catalog the options ask for
    pub fn open_catalog(options: &AssemblyOptions) -> Result<Box<dyn CatalogSource>, JlcBomError> {
        if options.online {
            Ok(Box::new(LiveCatalog::new()?))
        } else {
            Ok(Box::new(SnapshotCatalog::load(&options.catalog_path)?))
        }
    }

    /// Read, group and match a board using the catalog from `options`
    pub fn run(path: &Path, options: &AssemblyOptions) -> Result<AssemblyResult, JlcBomError> {
        let board = Self::read_board(path, options)?;
        let catalog = Self::open_catalog(options)?;
        Self::assemble_board(path, board, options, catalog.as_ref())
    }

    /// Read, group and match a board against `source`
    pub fn assemble(
        path: &Path,
        options: &AssemblyOptions,
        source: &dyn CatalogSource,
    ) -> Result<AssemblyResult, JlcBomError> {
        let board = Self::read_board(path, options)?;
        Self::assemble_board(path, board, options, source)
    }

    pub fn read_board(path: &Path, options: &AssemblyOptions) -> Result<Board, JlcBomError> {
        let parser = EagleParser::new().with_part_number_attribute(options.part_number_attribute.as_str());
        Ok(parser.parse_board(path)?)
    }

    /// Group and match an already parsed board
    pub fn assemble_board(
        path: &Path,
        board: Board,
        options: &AssemblyOptions,
        source: &dyn CatalogSource,
    ) -> Result<AssemblyResult, JlcBomError> {
        let grouper = Grouper::new(&options.grouping_options())?;
        let grouping = grouper.group(board.components);
        let mut groups = grouping.groups;

        let matcher = Matcher::new(options.match_options());
        let match_report = matcher.match_groups(&mut groups, source)?;

        let report = AssemblyReport::from_groups(&groups);

        Ok(AssemblyResult {
            file: path.to_path_buf(),
            groups,
            excluded: grouping.excluded,
            ignored: grouping.ignored,
            missing: match_report.missing,
            report,
        })
    }
}
