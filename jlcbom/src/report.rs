//! BOM and placement output
//!
//! Column names and order follow the JLCPCB assembly templates and must not
//! change:
//!
//! - BOM: `Comment, Designator, Footprint, LCSC Part #, Type`
//! - CPL: `Designator, Mid X, Mid Y, Layer, Rotation`

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::catalog::LibraryTier;
use crate::grouping::ComponentGroup;

pub const BOM_HEADERS: [&str; 5] = ["Comment", "Designator", "Footprint", "LCSC Part #", "Type"];
pub const CPL_HEADERS: [&str; 5] = ["Designator", "Mid X", "Mid Y", "Layer", "Rotation"];

/// Unit appended to placement coordinates
pub const LENGTH_UNIT: &str = "mm";

pub const BOM_FILE: &str = "bom.csv";
pub const CPL_FILE: &str = "cpl.csv";

/// One BOM line (one group)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BomRow {
    pub comment: String,
    pub designator: String,
    pub footprint: String,
    pub part_code: String,
    pub tier: String,
}

impl BomRow {
    pub fn from_group(group: &ComponentGroup) -> Self {
        let part = group.result.part();
        let footprint = part
            .map(|p| p.specification.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(&group.identity.package);

        Self {
            comment: group.display_value.clone(),
            designator: group.designators().join(","),
            footprint: footprint.to_string(),
            part_code: part.map(|p| p.part_code.clone()).unwrap_or_default(),
            tier: part
                .map(|p| p.library_tier.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    fn record(&self) -> [&str; 5] {
        [
            self.comment.as_str(),
            self.designator.as_str(),
            self.footprint.as_str(),
            self.part_code.as_str(),
            self.tier.as_str(),
        ]
    }
}

/// One pick-and-place line (one physical component)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementRow {
    pub designator: String,
    pub mid_x: String,
    pub mid_y: String,
    pub layer: String,
    pub rotation: String,
}

impl PlacementRow {
    fn record(&self) -> [&str; 5] {
        [
            self.designator.as_str(),
            self.mid_x.as_str(),
            self.mid_y.as_str(),
            self.layer.as_str(),
            self.rotation.as_str(),
        ]
    }
}

/// A group resolved to a catalog part, for the console summary
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FoundPart {
    pub designators: Vec<String>,
    pub part_code: String,
    pub description: String,
    pub library_tier: LibraryTier,
}

/// Everything written for the assembler
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssemblyReport {
    pub bom: Vec<BomRow>,
    pub placements: Vec<PlacementRow>,
    /// Sorted by designator list
    pub found: Vec<FoundPart>,
    /// Designator lists of unmatched groups, sorted
    pub missing: Vec<Vec<String>>,
}

impl AssemblyReport {
    /// Build the report from groups in creation order
    pub fn from_groups(groups: &[ComponentGroup]) -> Self {
        let bom = groups.iter().map(BomRow::from_group).collect();

        let placements = groups
            .iter()
            .flat_map(|g| g.members())
            .map(|m| PlacementRow {
                designator: m.name.clone(),
                mid_x: format!("{}{}", m.position.x, LENGTH_UNIT),
                mid_y: format!("{}{}", m.position.y, LENGTH_UNIT),
                layer: m.side.to_string(),
                rotation: m.rotation.to_string(),
            })
            .collect();

        let mut found = Vec::new();
        let mut missing = Vec::new();
        for group in groups {
            let mut designators: Vec<String> =
                group.designators().into_iter().map(str::to_string).collect();
            designators.sort();
            match group.result.part() {
                Some(part) => found.push(FoundPart {
                    designators,
                    part_code: part.part_code.clone(),
                    description: part.description.clone(),
                    library_tier: part.library_tier,
                }),
                None => missing.push(designators),
            }
        }
        found.sort();
        missing.sort();

        Self {
            bom,
            placements,
            found,
            missing,
        }
    }

    pub fn write_bom<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(BOM_HEADERS)?;
        for row in &self.bom {
            wtr.write_record(row.record())?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_cpl<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CPL_HEADERS)?;
        for row in &self.placements {
            wtr.write_record(row.record())?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write `bom.csv` and `cpl.csv` into `dir`, returning both paths
    pub fn write_files(&self, dir: &Path) -> Result<(PathBuf, PathBuf), csv::Error> {
        let bom_path = dir.join(BOM_FILE);
        let cpl_path = dir.join(CPL_FILE);
        self.write_bom(std::fs::File::create(&bom_path)?)?;
        self.write_cpl(std::fs::File::create(&cpl_path)?)?;
        tracing::info!(
            "Wrote {} BOM lines to {} and {} placements to {}",
            self.bom.len(),
            bom_path.display(),
            self.placements.len(),
            cpl_path.display()
        );
        Ok((bom_path, cpl_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, SnapshotCatalog};
    use crate::grouping::{Grouper, GroupingOptions};
    use crate::matcher::{MatchOptions, Matcher};
    use crate::parser::schema::{BoardComponent, Position, Side};

    fn component(name: &str, package: &str, value: &str, x: &str, rotation: f64) -> BoardComponent {
        BoardComponent {
            name: name.to_string(),
            package: package.to_string(),
            value: value.to_string(),
            position: Position {
                x: x.to_string(),
                y: "2.54".to_string(),
            },
            rotation,
            side: Side::Top,
            part_number: None,
        }
    }

    fn report() -> AssemblyReport {
        let mut groups = Grouper::new(&GroupingOptions::default()).unwrap().group(vec![
            component("R2", "R0603", "4K7", "10.16", 270.0),
            component("C1", "C0402", "22PF", "0", 180.0),
            component("R1", "R0603", "4K7", "-5.08", 202.5),
        ]).groups;
        let catalog = SnapshotCatalog::from_entries(vec![CatalogEntry {
            part_code: "C23162".to_string(),
            description: "RESISTOR 4.7K 0603".to_string(),
            library_tier: LibraryTier::Basic,
            specification: "0603".to_string(),
            model_name: "0603WAF4701T5E".to_string(),
            stock_count: 10,
        }]);
        Matcher::new(MatchOptions::default())
            .match_groups(&mut groups, &catalog)
            .unwrap();
        AssemblyReport::from_groups(&groups)
    }

    #[test]
    fn test_bom_rows() {
        let report = report();
        assert_eq!(
            report.bom,
            vec![
                BomRow {
                    comment: "4K7".to_string(),
                    designator: "R2,R1".to_string(),
                    footprint: "0603".to_string(),
                    part_code: "C23162".to_string(),
                    tier: "base".to_string(),
                },
                BomRow {
                    comment: "22PF".to_string(),
                    designator: "C1".to_string(),
                    footprint: "0402".to_string(),
                    part_code: String::new(),
                    tier: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_placement_rows() {
        let report = report();
        let rows: Vec<_> = report.placements.iter().map(|r| r.record().map(str::to_string)).collect();
        assert_eq!(rows[0], ["R2", "10.16mm", "2.54mm", "Top", "270"]);
        assert_eq!(rows[1], ["R1", "-5.08mm", "2.54mm", "Top", "202.5"]);
        assert_eq!(rows[2], ["C1", "0mm", "2.54mm", "Top", "180"]);
    }

    #[test]
    fn test_summary_is_sorted() {
        let report = report();
        assert_eq!(report.found.len(), 1);
        assert_eq!(report.found[0].designators, ["R1", "R2"]);
        assert_eq!(report.missing, vec![vec!["C1".to_string()]]);
    }

    #[test]
    fn test_csv_output() {
        let report = report();

        let mut bom = Vec::new();
        report.write_bom(&mut bom).unwrap();
        let bom = String::from_utf8(bom).unwrap();
        let lines: Vec<_> = bom.lines().collect();
        assert_eq!(
            lines,
            [
                "Comment,Designator,Footprint,LCSC Part #,Type",
                "4K7,\"R2,R1\",0603,C23162,base",
                "22PF,C1,0402,,",
            ]
        );

        let mut cpl = Vec::new();
        report.write_cpl(&mut cpl).unwrap();
        let cpl = String::from_utf8(cpl).unwrap();
        let lines: Vec<_> = cpl.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Designator,Mid X,Mid Y,Layer,Rotation");
        assert_eq!(lines[1], "R2,10.16mm,2.54mm,Top,270");
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let (bom, cpl) = report().write_files(dir.path()).unwrap();
        assert!(std::fs::read_to_string(bom).unwrap().starts_with("Comment,"));
        assert!(std::fs::read_to_string(cpl).unwrap().starts_with("Designator,"));
    }
}
