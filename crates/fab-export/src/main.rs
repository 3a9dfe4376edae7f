use clap::{Parser, Subcommand};
use fab_export::bom::board_path_for;
use fab_export::{
    export_bom, export_placement, BomConfig, Corrections, ExportError, KicadBoard,
    PlacementConfig, RefFilter, TargetFormat,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fab-export",
    about = "Export pick-and-place and BOM files for PCB assembly"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write top/bottom placement (CPL) files for a board
    Cpl {
        /// Input board file (.kicad_pcb)
        board: PathBuf,

        /// Placement format (jlc, pos)
        #[arg(short, long, default_value = "jlc")]
        format: String,

        /// Board units per millimetre, overriding the format's default
        #[arg(long)]
        unit_divisor: Option<f64>,

        /// JSON file with rotation/offset correction tables
        #[arg(short, long)]
        corrections: Option<PathBuf>,

        /// Reference prefix to skip (repeatable; replaces the defaults)
        #[arg(long = "ignore", value_name = "PREFIX")]
        ignore: Vec<String>,

        /// Output path prefix (defaults to the board path without extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write top/bottom BOM files from a netlist and its board
    Bom {
        /// KiCad XML netlist export
        netlist: PathBuf,

        /// Output path prefix
        output: PathBuf,

        /// Board file (defaults to the netlist path with .kicad_pcb)
        #[arg(long)]
        board: Option<PathBuf>,

        /// Reference prefix to skip (repeatable; replaces the defaults)
        #[arg(long = "ignore", value_name = "PREFIX")]
        ignore: Vec<String>,
    },
}

fn parse_format(s: &str, unit_divisor: Option<f64>) -> Result<TargetFormat, String> {
    let format = TargetFormat::by_name(s)
        .ok_or_else(|| format!("Unknown format: {s}. Use: jlc, pos"))?;
    match unit_divisor {
        Some(d) if !d.is_finite() || d <= 0.0 => Err(format!("Invalid unit divisor: {d}")),
        Some(d) => Ok(format.with_unit_divisor(d)),
        None => Ok(format),
    }
}

fn run_cpl(
    board: PathBuf,
    format: TargetFormat,
    corrections: Option<PathBuf>,
    ignore: Vec<String>,
    output: Option<PathBuf>,
) -> Result<(), ExportError> {
    let corrections = match corrections {
        Some(path) => Corrections::load(&path)?,
        None => Corrections::builtin()?,
    };
    let mut config = PlacementConfig::new(format, corrections);
    if !ignore.is_empty() {
        config.ignore = RefFilter::new(ignore);
    }
    config.output_base = output;

    let board = KicadBoard::load(&board)?;
    let out = export_placement(&board, &config)?;
    eprintln!(
        "Placement files generated: {} ({} parts), {} ({} parts)",
        out.top_path.display(),
        out.top_count,
        out.bottom_path.display(),
        out.bottom_count
    );
    if !out.dropped.is_empty() {
        eprintln!("Skipped (not on an outer copper layer): {}", out.dropped.join(" "));
    }
    Ok(())
}

fn run_bom(
    netlist: PathBuf,
    output: PathBuf,
    board: Option<PathBuf>,
    ignore: Vec<String>,
) -> Result<(), ExportError> {
    let mut config = BomConfig::default();
    if !ignore.is_empty() {
        config.ignore = RefFilter::new(ignore);
    }
    let board = board.unwrap_or_else(|| board_path_for(&netlist));
    let out = export_bom(&netlist, &board, &output, &config)?;
    eprintln!(
        "BOM files generated: {} ({} rows), {} ({} rows)",
        out.top_path.display(),
        out.top_rows,
        out.bottom_path.display(),
        out.bottom_rows
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Cpl {
            board,
            format,
            unit_divisor,
            corrections,
            ignore,
            output,
        } => {
            let format = match parse_format(&format, unit_divisor) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            };
            run_cpl(board, format, corrections, ignore, output)
        }
        Command::Bom {
            netlist,
            output,
            board,
            ignore,
        } => run_bom(netlist, output, board, ignore),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("jlc", None), Ok(TargetFormat::jlc()));
        assert_eq!(
            parse_format("pos", Some(10_000_000.0)).map(|f| f.unit_divisor),
            Ok(10_000_000.0)
        );
        assert!(parse_format("gerber", None).is_err());
    }

    #[test]
    fn test_rejects_unusable_unit_divisors() {
        for d in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(parse_format("jlc", Some(d)).is_err(), "accepted {d}");
        }
    }
}
