//! Footprint and value normalization
//!
//! Library footprints and values are written in many styles (`R0603`,
//! `0603`, `SOT23`, `4R7`, `4K7`...). Before placements can be grouped or
//! looked up in the catalog they are reduced to a canonical form:
//!
//! ```text
//!   raw (package, value)
//!          │  trim + upper-case
//!          ▼
//!   ┌───────────────┐  first match wins   ┌──────────────────────────┐
//!   │  rule table   │────────────────────▶│ (package, value, kind)   │
//!   └───────────────┘                     └──────────────────────────┘
//!          │ no match
//!          ▼
//!   long package fallback
//! ```
//!
//! The rule table is exposed through [`rules`] so every rule can be
//! inspected and tested on its own.

pub mod rules;

use serde::{Deserialize, Serialize};

pub use rules::{rules, FootprintRule};

/// Part family implied by the footprint, used to narrow catalog searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartKind {
    Resistor,
    Capacitor,
    Inductor,
    Diode,
    Led,
}

impl PartKind {
    /// Word expected in a catalog description for this kind of part
    pub fn as_str(&self) -> &'static str {
        match self {
            PartKind::Resistor => "RESISTOR",
            PartKind::Capacitor => "CAPACITOR",
            PartKind::Inductor => "INDUCTOR",
            PartKind::Diode => "DIODE",
            PartKind::Led => "LED",
        }
    }
}

impl std::fmt::Display for PartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical form of a footprint/value pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedPart {
    /// Empty when the footprint is too specific to help matching
    pub package: String,
    pub value: String,
    pub kind: Option<PartKind>,
}

/// Normalize a raw footprint label and value.
///
/// Pure: the same input always yields the same output, and feeding the
/// output package and value back in returns them unchanged.
pub fn normalize(package: &str, value: &str) -> NormalizedPart {
    let package = package.trim().to_uppercase();
    let value = value.trim().to_uppercase();

    rules()
        .iter()
        .find_map(|rule| rule.apply(&package, &value))
        .unwrap_or_else(|| rules::long_package(&package, &value))
}
