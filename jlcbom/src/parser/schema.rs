//! Board data model shared by the reader, the grouper and the report writer.

use serde::{Deserialize, Serialize};

/// Board side a component is mounted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Top,
    Bottom,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Top => "Top",
            Side::Bottom => "Bottom",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component origin, kept as the text found in the board file.
///
/// The reader checks that both coordinates parse as numbers, but the
/// placement file repeats them verbatim so no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: String,
    pub y: String,
}

/// One physical placement read from the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardComponent {
    /// Designator, e.g. `R1`
    pub name: String,
    /// Footprint label as drawn in the library
    pub package: String,
    /// Electrical value, e.g. `4K7`
    pub value: String,
    pub position: Position,
    /// Degrees in `[0, 360)`, already converted to the assembler convention
    pub rotation: f64,
    pub side: Side,
    /// Supplier part code attached to the element, if any
    pub part_number: Option<String>,
}

/// Everything the reader extracts from a board file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    pub filename: String,
    /// Layer number to layer name
    pub layers: Vec<(String, String)>,
    pub components: Vec<BoardComponent>,
}
