//! Simple assembly example: match a board against a snapshot and print the BOM.

use jlcbom::prelude::*;
use std::path::{Path, PathBuf};

fn main() -> Result<(), JlcBomError> {
    let mut args = std::env::args().skip(1);
    let board = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/simple_board.brd".to_string());
    let catalog = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/catalog.json".to_string());
    let board = Path::new(&board);

    if !board.exists() {
        eprintln!("File not found: {}", board.display());
        eprintln!("Usage: cargo run --example simple_assembly [board.brd] [catalog.json]");
        std::process::exit(1);
    }

    let options = AssemblyOptions {
        catalog_path: PathBuf::from(catalog),
        ..Default::default()
    };

    let result = AssemblyCore::run(board, &options)?;

    println!("Assembly for: {}", result.file.display());
    println!(
        "{} groups, {} matched, {} placements",
        result.groups.len(),
        result.matched_count(),
        result.placement_count()
    );
    println!();

    for row in &result.report.bom {
        println!(
            "  {:<12} {:<20} {:<10} {:<8} {}",
            row.comment, row.designator, row.footprint, row.part_code, row.tier
        );
    }

    if result.has_missing() {
        println!("\nNo part found for:");
        for designators in &result.report.missing {
            println!("  - {}", designators.join(","));
        }
        std::process::exit(1);
    }

    println!("\nAll groups matched.");
    Ok(())
}
