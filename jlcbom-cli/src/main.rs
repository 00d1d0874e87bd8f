//! jlcbom CLI - JLCPCB BOM and placement files from EAGLE boards.

use clap::{Parser, Subcommand, ValueEnum};
use jlcbom::catalog::snapshot::DEFAULT_SNAPSHOT_FILE;
use jlcbom::parser::DEFAULT_PART_NUMBER_ATTRIBUTE;
use jlcbom::{
    normalize, AssemblyCore, AssemblyOptions, AssemblyResult, CatalogEntry, LiveCatalog,
    SnapshotCatalog,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jlcbom")]
#[command(about = "JLCPCB assembly BOM and CPL generator for EAGLE boards", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write bom.csv and cpl.csv for a board
    Generate {
        /// Path to the EAGLE .brd file
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        /// Catalog snapshot file
        #[arg(long, value_name = "PATH", default_value = DEFAULT_SNAPSHOT_FILE)]
        catalog: PathBuf,

        /// Query the JLCPCB search API instead of the snapshot
        #[arg(short, long)]
        online: bool,

        /// Only match on the part number attribute
        #[arg(short = 'm', long = "match")]
        strict: bool,

        /// Select parts even if stock is insufficient
        #[arg(short = 'n', long)]
        nostock: bool,

        /// Leave out designators matching this regex unless they carry a part number
        #[arg(short, long, value_name = "REGEX")]
        ignore: Option<String>,

        /// Element attribute holding the LCSC part number
        #[arg(long, value_name = "NAME", default_value = DEFAULT_PART_NUMBER_ATTRIBUTE)]
        attribute: String,

        /// Directory to write the output files into
        #[arg(long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if any group has no part
        #[arg(long)]
        fail_on_missing: bool,
    },

    /// Search the live JLCPCB catalog
    Search {
        #[arg(value_name = "KEYWORD")]
        keyword: String,

        /// Save the results as a catalog snapshot
        #[arg(long, value_name = "PATH")]
        save: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Show how a footprint and value are normalized for matching
    Normalize {
        #[arg(value_name = "PACKAGE")]
        package: String,

        #[arg(value_name = "VALUE")]
        value: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Generate {
            board,
            catalog,
            online,
            strict,
            nostock,
            ignore,
            attribute,
            output_dir,
            format,
            fail_on_missing,
        } => {
            let options = AssemblyOptions {
                strict_match: strict,
                ignore_stock: nostock,
                ignore_pattern: ignore,
                online,
                catalog_path: catalog,
                part_number_attribute: attribute,
            };
            handle_generate(&board, &options, &output_dir, format, fail_on_missing)
        }
        Commands::Search {
            keyword,
            save,
            format,
        } => handle_search(&keyword, save.as_deref(), format),
        Commands::Normalize {
            package,
            value,
            format,
        } => {
            handle_normalize(&package, &value, format);
            0
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_generate(
    board: &Path,
    options: &AssemblyOptions,
    output_dir: &Path,
    format: OutputFormat,
    fail_on_missing: bool,
) -> i32 {
    tracing::debug!("Assembly options: {:?}", options);
    let result = match AssemblyCore::run(board, options) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let (bom_path, cpl_path) = match result.write_outputs(output_dir) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match format {
        OutputFormat::Human => output_human(&result, &bom_path, &cpl_path),
        OutputFormat::Json => output_json(&result, &bom_path, &cpl_path),
    }

    if fail_on_missing && result.has_missing() {
        return 1;
    }
    0
}

fn output_human(result: &AssemblyResult, bom_path: &Path, cpl_path: &Path) {
    println!("\nBoard: {}", result.file.display());
    println!("{}", "─".repeat(60));

    if !result.report.found.is_empty() {
        println!("\nFound parts:");
        for part in &result.report.found {
            println!(
                "  {:<20} {:<10} {:<9} {}",
                part.designators.join(","),
                part.part_code,
                part.library_tier.as_str(),
                part.description
            );
        }
    }

    if !result.report.missing.is_empty() {
        println!("\nMissing parts:");
        for designators in &result.report.missing {
            println!("  {}", designators.join(","));
        }
    }

    if !result.ignored.is_empty() {
        println!("\nIgnored: {}", result.ignored.join(","));
    }
    if !result.excluded.is_empty() {
        let names: Vec<_> = result.excluded.iter().map(|c| c.name.as_str()).collect();
        println!("Not on top side: {}", names.join(","));
    }

    println!(
        "\nSummary: {} groups, {} matched, {} missing, {} placements",
        result.groups.len(),
        result.matched_count(),
        result.missing.len(),
        result.placement_count()
    );
    println!("BOM: {}", bom_path.display());
    println!("CPL: {}", cpl_path.display());
}

fn output_json(result: &AssemblyResult, bom_path: &Path, cpl_path: &Path) {
    let output = serde_json::json!({
        "file": result.file.display().to_string(),
        "bom": result.report.bom,
        "found": result.report.found.iter().map(|p| serde_json::json!({
            "designators": p.designators,
            "part_code": p.part_code,
            "description": p.description,
            "type": p.library_tier.as_str(),
        })).collect::<Vec<_>>(),
        "missing": result.report.missing,
        "ignored": result.ignored,
        "excluded": result.excluded.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        "outputs": {
            "bom": bom_path.display().to_string(),
            "cpl": cpl_path.display().to_string(),
        },
        "summary": {
            "groups": result.groups.len(),
            "matched": result.matched_count(),
            "missing": result.missing.len(),
            "placements": result.placement_count(),
        }
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
}

fn handle_search(keyword: &str, save: Option<&Path>, format: OutputFormat) -> i32 {
    let entries = match LiveCatalog::new().and_then(|catalog| catalog.search(keyword)) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match format {
        OutputFormat::Human => output_entries_human(keyword, &entries),
        OutputFormat::Json => output_entries_json(&entries),
    }

    if let Some(path) = save {
        let snapshot = SnapshotCatalog::from_entries(entries);
        if let Err(e) = snapshot.save(path) {
            eprintln!("Error: {}", e);
            return 1;
        }
        eprintln!("Saved {} components to {}", snapshot.len(), path.display());
    }
    0
}

fn output_entries_human(keyword: &str, entries: &[CatalogEntry]) {
    println!("Results for '{}': {}", keyword, entries.len());
    for entry in entries {
        println!(
            "  {:<10} {:<9} {:>9}  {}",
            entry.part_code,
            entry.library_tier.as_str(),
            entry.stock_count,
            entry.description
        );
    }
}

fn output_entries_json(entries: &[CatalogEntry]) {
    let output = serde_json::json!(entries
        .iter()
        .map(|e| serde_json::json!({
            "part_code": e.part_code,
            "description": e.description,
            "type": e.library_tier.as_str(),
            "specification": e.specification,
            "model": e.model_name,
            "stock": e.stock_count,
        }))
        .collect::<Vec<_>>());
    println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
}

fn handle_normalize(package: &str, value: &str, format: OutputFormat) {
    let normalized = normalize(package, value);
    let kind = normalized.kind.map_or("-", |k| k.as_str());

    match format {
        OutputFormat::Human => {
            println!("Package: {}", normalized.package);
            println!("Value:   {}", normalized.value);
            println!("Kind:    {}", kind);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "package": normalized.package,
                "value": normalized.value,
                "kind": normalized.kind.map(|k| k.as_str()),
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
        }
    }
}
