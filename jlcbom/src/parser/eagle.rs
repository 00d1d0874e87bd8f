//! Eagle Board Parser
//!
//! Reads Eagle `.brd` files (XML since Eagle 6). Only the parts of the
//! format needed for assembly are consumed:
//! - `layer` nodes (number and name)
//! - `element` nodes: `name`, `package`, `value`, `x`, `y`, `rot`
//! - an optional child `attribute` carrying the supplier part number
//!
//! Coordinates are kept as text. Rotation is converted to the assembler
//! convention while reading, see [`resolve_rotation`].

use std::path::Path;

use roxmltree::{Document, Node};
use thiserror::Error;

use crate::grouping::{resolve_rotation, RotationError};
use crate::parser::schema::*;

/// Attribute name holding the LCSC part number in the Eagle library
pub const DEFAULT_PART_NUMBER_ATTRIBUTE: &str = "LCSC#";

#[derive(Debug, Error)]
pub enum EagleParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("Invalid board format: {0}")]
    InvalidFormat(String),
    #[error("Element {element}: missing attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },
    #[error("Element {element}: malformed attribute '{attribute}' = '{value}'")]
    MalformedAttribute {
        element: String,
        attribute: String,
        value: String,
    },
    #[error("Element {element}: {source}")]
    Rotation {
        element: String,
        #[source]
        source: RotationError,
    },
}

/// Parser for Eagle XML board files
pub struct EagleParser {
    part_number_attribute: String,
}

impl Default for EagleParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EagleParser {
    pub fn new() -> Self {
        Self {
            part_number_attribute: DEFAULT_PART_NUMBER_ATTRIBUTE.to_string(),
        }
    }

    /// Read the part number from a differently named element attribute
    pub fn with_part_number_attribute(mut self, name: impl Into<String>) -> Self {
        self.part_number_attribute = name.into();
        self
    }

    pub fn parse_board(&self, path: &Path) -> Result<Board, EagleParseError> {
        let content = std::fs::read_to_string(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        self.parse_board_str(&content, &filename)
    }

    pub fn parse_board_str(&self, content: &str, filename: &str) -> Result<Board, EagleParseError> {
        let doc = Document::parse(content)?;

        let root = doc.root_element();
        if !root.has_tag_name("eagle") {
            return Err(EagleParseError::InvalidFormat(format!(
                "Expected eagle root, found {}",
                root.tag_name().name()
            )));
        }

        let layers = root
            .descendants()
            .filter(|n| n.has_tag_name("layer"))
            .filter_map(|n| Some((n.attribute("number")?.to_string(), n.attribute("name")?.to_string())))
            .collect();

        let components = root
            .descendants()
            .filter(|n| n.has_tag_name("element"))
            .map(|n| self.parse_element(n))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!("Read {} elements from {}", components.len(), filename);

        Ok(Board {
            filename: filename.to_string(),
            layers,
            components,
        })
    }

    fn parse_element(&self, node: Node) -> Result<BoardComponent, EagleParseError> {
        let name = required(node, "?", "name")?.trim().to_uppercase();
        let package = required(node, &name, "package")?.trim().to_uppercase();
        let value = required(node, &name, "value")?.trim().to_uppercase();
        let x = coordinate(node, &name, "x")?;
        let y = coordinate(node, &name, "y")?;

        let rot = node.attribute("rot").unwrap_or("R0");
        let (side, rotation) = resolve_rotation(rot).map_err(|source| EagleParseError::Rotation {
            element: name.clone(),
            source,
        })?;

        let part_number = node
            .children()
            .filter(|c| c.has_tag_name("attribute"))
            .find(|c| c.attribute("name") == Some(self.part_number_attribute.as_str()))
            .and_then(|c| c.attribute("value"))
            .map(|v| v.trim().to_uppercase())
            .filter(|v| !v.is_empty());

        Ok(BoardComponent {
            name,
            package,
            value,
            position: Position { x, y },
            rotation,
            side,
            part_number,
        })
    }
}

fn required<'a>(node: Node<'a, '_>, element: &str, attribute: &str) -> Result<&'a str, EagleParseError> {
    node.attribute(attribute)
        .ok_or_else(|| EagleParseError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        })
}

fn coordinate(node: Node, element: &str, attribute: &str) -> Result<String, EagleParseError> {
    let raw = required(node, element, attribute)?.trim();
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(raw.to_string()),
        _ => Err(EagleParseError::MalformedAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
            value: raw.to_string(),
        }),
    }
}
