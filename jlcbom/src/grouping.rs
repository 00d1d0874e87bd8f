//! Placement grouping
//!
//! Placements that normalize to the same `(value, package, part number)`
//! are interchangeable for sourcing and become one BOM line. Groups are
//! kept in creation order so output is deterministic.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use thiserror::Error;

use crate::matcher::MatchResult;
use crate::normalize::{normalize, PartKind};
use crate::parser::schema::{BoardComponent, Side};

#[derive(Debug, Error, PartialEq)]
pub enum RotationError {
    #[error("rotation '{0}' does not start with R")]
    MissingPrefix(String),
    #[error("rotation '{0}' has no numeric angle")]
    InvalidAngle(String),
}

#[derive(Debug, Error)]
pub enum GroupingError {
    #[error("Invalid ignore pattern: {0}")]
    InvalidIgnorePattern(#[from] regex::Error),
}

/// Resolve an Eagle rotation attribute (`R90`, `MR180`, ...) into a side and
/// an angle in the assembler convention.
///
/// Eagle measures rotation the other way round from the pick-and-place
/// data JLCPCB expects, hence the 180° offset.
pub fn resolve_rotation(raw: &str) -> Result<(Side, f64), RotationError> {
    let raw = raw.trim();
    let (side, rest) = match raw.strip_prefix('M') {
        Some(rest) => (Side::Bottom, rest),
        None => (Side::Top, raw),
    };
    let angle = rest
        .strip_prefix('R')
        .ok_or_else(|| RotationError::MissingPrefix(raw.to_string()))?;
    let angle: f64 = angle
        .parse()
        .ok()
        .filter(|a: &f64| a.is_finite())
        .ok_or_else(|| RotationError::InvalidAngle(raw.to_string()))?;

    let rotation = (angle + 180.0).rem_euclid(360.0);
    // rem_euclid can yield -0.0, or 360.0 for tiny negative inputs
    if rotation == 0.0 || rotation >= 360.0 {
        return Ok((side, 0.0));
    }
    Ok((side, rotation))
}

/// Key under which interchangeable placements are grouped
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NormalizedIdentity {
    pub value: String,
    pub package: String,
    pub part_number: Option<String>,
}

/// Placements sharing one identity, plus the catalog outcome for them
#[derive(Debug, Clone, Serialize)]
pub struct ComponentGroup {
    pub identity: NormalizedIdentity,
    /// Kind implied by the first member's footprint
    pub kind: Option<PartKind>,
    /// Upper-cased value of the first member, as written on the board
    pub display_value: String,
    members: Vec<BoardComponent>,
    pub result: MatchResult,
}

impl ComponentGroup {
    fn new(identity: NormalizedIdentity, kind: Option<PartKind>, first: BoardComponent) -> Self {
        Self {
            identity,
            kind,
            display_value: first.value.clone(),
            members: vec![first],
            result: MatchResult::default(),
        }
    }

    pub fn members(&self) -> &[BoardComponent] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn designators(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Grouping configuration
#[derive(Debug, Clone, Default)]
pub struct GroupingOptions {
    /// Designators to skip when they carry no part number (regex, matched
    /// from the start of the name)
    pub ignore_pattern: Option<String>,
}

/// Outcome of grouping a board
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    /// Groups in creation order
    pub groups: Vec<ComponentGroup>,
    /// Placements excluded because they are not on the top side
    pub excluded: Vec<BoardComponent>,
    /// Designators skipped by the ignore pattern
    pub ignored: Vec<String>,
}

impl Grouping {
    pub fn placement_count(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }
}

pub struct Grouper {
    ignore: Option<Regex>,
}

impl Grouper {
    pub fn new(options: &GroupingOptions) -> Result<Self, GroupingError> {
        let ignore = options
            .ignore_pattern
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| RegexBuilder::new(&format!("^(?:{p})")).case_insensitive(true).build())
            .transpose()?;
        Ok(Self { ignore })
    }

    fn is_ignored(&self, component: &BoardComponent) -> bool {
        component.part_number.is_none()
            && self.ignore.as_ref().is_some_and(|re| re.is_match(&component.name))
    }

    pub fn group<I>(&self, components: I) -> Grouping
    where
        I: IntoIterator<Item = BoardComponent>,
    {
        let mut grouping = Grouping::default();
        let mut index: HashMap<NormalizedIdentity, usize> = HashMap::new();

        for component in components {
            if self.is_ignored(&component) {
                tracing::warn!("Ignoring part: {}", component.name);
                grouping.ignored.push(component.name);
                continue;
            }
            if component.side != Side::Top {
                tracing::debug!("Skipping {} on {} side", component.name, component.side);
                grouping.excluded.push(component);
                continue;
            }

            let normalized = normalize(&component.package, &component.value);
            let identity = NormalizedIdentity {
                value: normalized.value,
                package: normalized.package,
                part_number: component.part_number.clone(),
            };

            match index.get(&identity) {
                Some(&i) => grouping.groups[i].members.push(component),
                None => {
                    index.insert(identity.clone(), grouping.groups.len());
                    grouping
                        .groups
                        .push(ComponentGroup::new(identity, normalized.kind, component));
                }
            }
        }

        tracing::info!(
            "Grouped {} placements into {} groups ({} excluded, {} ignored)",
            grouping.placement_count(),
            grouping.groups.len(),
            grouping.excluded.len(),
            grouping.ignored.len()
        );
        grouping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::Position;

    fn component(name: &str, package: &str, value: &str) -> BoardComponent {
        BoardComponent {
            name: name.to_string(),
            package: package.to_string(),
            value: value.to_string(),
            position: Position {
                x: "1.0".to_string(),
                y: "2.0".to_string(),
            },
            rotation: 180.0,
            side: Side::Top,
            part_number: None,
        }
    }

    fn with_part_number(mut c: BoardComponent, pn: &str) -> BoardComponent {
        c.part_number = Some(pn.to_string());
        c
    }

    #[test]
    fn test_resolve_rotation() {
        assert_eq!(resolve_rotation("R0"), Ok((Side::Top, 180.0)));
        assert_eq!(resolve_rotation("R90"), Ok((Side::Top, 270.0)));
        assert_eq!(resolve_rotation("MR90"), Ok((Side::Bottom, 270.0)));
        assert_eq!(resolve_rotation("R180"), Ok((Side::Top, 0.0)));
        assert_eq!(resolve_rotation("R270"), Ok((Side::Top, 90.0)));
        assert_eq!(resolve_rotation("R-90"), Ok((Side::Top, 90.0)));
        assert_eq!(resolve_rotation("R540"), Ok((Side::Top, 0.0)));
        assert_eq!(resolve_rotation("R22.5"), Ok((Side::Top, 202.5)));
    }

    #[test]
    fn test_resolve_rotation_errors() {
        assert!(matches!(resolve_rotation("90"), Err(RotationError::MissingPrefix(_))));
        assert!(matches!(resolve_rotation("M90"), Err(RotationError::MissingPrefix(_))));
        assert!(matches!(resolve_rotation("R"), Err(RotationError::InvalidAngle(_))));
        assert!(matches!(resolve_rotation("RX"), Err(RotationError::InvalidAngle(_))));
        assert!(matches!(resolve_rotation("RNaN"), Err(RotationError::InvalidAngle(_))));
    }

    #[test]
    fn test_rotation_range() {
        for angle in -720..=720 {
            let (_, rot) = resolve_rotation(&format!("R{angle}")).unwrap();
            assert!((0.0..360.0).contains(&rot), "R{angle} -> {rot}");
        }
    }

    #[test]
    fn test_equal_identities_share_group() {
        let grouper = Grouper::new(&GroupingOptions::default()).unwrap();
        let grouping = grouper.group(vec![
            component("R1", "R0603", "4K7"),
            component("C1", "C0603", "100NF"),
            component("R2", "R0603", "4K7"),
            component("R3", "R0402", "4K7"),
        ]);

        assert_eq!(grouping.groups.len(), 3);
        assert_eq!(grouping.groups[0].designators(), ["R1", "R2"]);
        assert_eq!(grouping.groups[0].identity.value, "4.7K");
        assert_eq!(grouping.groups[0].identity.package, "0603");
        assert_eq!(grouping.groups[0].display_value, "4K7");
        assert_eq!(grouping.groups[0].kind, Some(PartKind::Resistor));
        assert_eq!(grouping.groups[1].designators(), ["C1"]);
        assert_eq!(grouping.groups[2].designators(), ["R3"]);
        assert_eq!(grouping.placement_count(), 4);
    }

    #[test]
    fn test_part_number_splits_groups() {
        let grouper = Grouper::new(&GroupingOptions::default()).unwrap();
        let grouping = grouper.group(vec![
            component("R1", "R0603", "10K"),
            with_part_number(component("R2", "R0603", "10K"), "C25804"),
            with_part_number(component("R3", "R0603", "10K"), "C25804"),
        ]);

        assert_eq!(grouping.groups.len(), 2);
        assert_eq!(grouping.groups[0].identity.part_number, None);
        assert_eq!(grouping.groups[1].designators(), ["R2", "R3"]);
    }

    #[test]
    fn test_every_pair_grouped_by_identity() {
        let components = vec![
            component("R1", "R0603", "10R"),
            component("R2", "R0603", "10OHM"),
            component("R3", "R0805", "10R"),
            component("C1", "C0603", "10NF"),
            component("C2", "0603", "10NF"),
            component("Q1", "SOT23", "BSS138"),
            component("Q2", "SOT-23", "BSS138"),
        ];
        let grouper = Grouper::new(&GroupingOptions::default()).unwrap();
        let grouping = grouper.group(components.clone());

        let group_of = |name: &str| {
            grouping
                .groups
                .iter()
                .position(|g| g.designators().contains(&name))
                .unwrap()
        };
        for a in &components {
            for b in &components {
                let na = normalize(&a.package, &a.value);
                let nb = normalize(&b.package, &b.value);
                let same = (na.value, na.package) == (nb.value, nb.package);
                assert_eq!(same, group_of(&a.name) == group_of(&b.name), "{} vs {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_bottom_side_excluded() {
        let mut bottom = component("R9", "R0603", "4K7");
        bottom.side = Side::Bottom;
        let grouper = Grouper::new(&GroupingOptions::default()).unwrap();
        let grouping = grouper.group(vec![component("R1", "R0603", "4K7"), bottom]);

        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].len(), 1);
        assert_eq!(grouping.excluded.len(), 1);
        assert_eq!(grouping.excluded[0].name, "R9");
    }

    #[test]
    fn test_ignore_pattern() {
        let options = GroupingOptions {
            ignore_pattern: Some("tp|FID".to_string()),
        };
        let grouper = Grouper::new(&options).unwrap();
        let grouping = grouper.group(vec![
            component("TP1", "TP10R", "TP"),
            component("FID1", "FIDUCIAL", ""),
            with_part_number(component("TP2", "TP10R", "TP"), "C5199798"),
            component("STP1", "SOIC8", "X"),
        ]);

        assert_eq!(grouping.ignored, ["TP1", "FID1"]);
        let names: Vec<_> = grouping.groups.iter().flat_map(|g| g.designators()).collect();
        assert_eq!(names, ["TP2", "STP1"]);
    }

    #[test]
    fn test_empty_ignore_pattern_ignores_nothing() {
        let options = GroupingOptions {
            ignore_pattern: Some(String::new()),
        };
        let grouping = Grouper::new(&options).unwrap().group(vec![component("TP1", "TP", "")]);
        assert!(grouping.ignored.is_empty());
        assert_eq!(grouping.groups.len(), 1);
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let options = GroupingOptions {
            ignore_pattern: Some("(".to_string()),
        };
        assert!(matches!(
            Grouper::new(&options),
            Err(GroupingError::InvalidIgnorePattern(_))
        ));
    }
}
