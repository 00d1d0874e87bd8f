//! jlcbom - JLCPCB assembly files from EAGLE boards
//!
//! This library reads component placements from an EAGLE `.brd` file,
//! groups identical parts, looks them up in the JLCPCB parts catalog and
//! writes the BOM and pick-and-place (CPL) files the assembly service asks
//! for.
//!
//! # Quick Start
//!
//! ```no_run
//! use jlcbom::{AssemblyCore, AssemblyOptions};
//! use std::path::Path;
//!
//! let options = AssemblyOptions::default();
//! let result = AssemblyCore::run(Path::new("board.brd"), &options).unwrap();
//!
//! result.report.write_files(Path::new(".")).unwrap();
//! for designators in &result.report.missing {
//!     println!("no part for {}", designators.join(","));
//! }
//! ```
//!
//! # Features
//!
//! - **Footprint normalization**: `R0603` and `4K7` become `0603` / `4.7K`
//! - **Grouping**: one BOM line per value, package and part number
//! - **Matching**: exact part numbers first, then description search,
//!   preferring basic library parts
//! - **Catalogs**: local JSON snapshot or live supplier search

pub mod catalog;
pub mod core;
pub mod grouping;
pub mod matcher;
pub mod normalize;
pub mod parser;
pub mod report;

// Re-export main types
pub use catalog::{CatalogEntry, CatalogError, CatalogSource, LibraryTier, LiveCatalog, SnapshotCatalog};
pub use crate::core::{AssemblyCore, AssemblyOptions, AssemblyResult, JlcBomError};
pub use grouping::{ComponentGroup, Grouper, NormalizedIdentity};
pub use matcher::{MatchOptions, Matcher};
pub use normalize::{normalize, NormalizedPart, PartKind};
pub use parser::eagle::EagleParser;
pub use parser::schema::{Board, BoardComponent, Side};
pub use report::AssemblyReport;

/// Parse a board file (convenience wrapper).
pub fn parse_board(path: &std::path::Path) -> Result<Board, JlcBomError> {
    EagleParser::new()
        .parse_board(path)
        .map_err(|e| JlcBomError::Parse(e.to_string()))
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AssemblyCore, AssemblyOptions, AssemblyReport, AssemblyResult, CatalogSource, JlcBomError,
        LibraryTier,
    };
}
