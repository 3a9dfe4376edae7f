use crate::corrections::Corrections;
use crate::error::ExportError;
use crate::filter::RefFilter;
use crate::parsers::kicad::BoardSource;
use crate::transform::TargetFormat;
use crate::types::*;
use crate::{csv_writer, output_path};
use log::{info, warn};
use std::path::PathBuf;

/// Configuration for one placement export run.
#[derive(Debug, Clone)]
pub struct PlacementConfig {
    pub format: TargetFormat,
    pub ignore: RefFilter,
    pub corrections: Corrections,
    /// Output path prefix; defaults to the board path without extension.
    pub output_base: Option<PathBuf>,
}

impl PlacementConfig {
    pub fn new(format: TargetFormat, corrections: Corrections) -> Self {
        Self {
            format,
            ignore: RefFilter::placement_default(),
            corrections,
            output_base: None,
        }
    }
}

/// What a placement export wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementOutput {
    pub top_path: PathBuf,
    pub bottom_path: PathBuf,
    pub top_count: usize,
    pub bottom_count: usize,
    /// References dropped because they sit on neither outer copper layer.
    pub dropped: Vec<String>,
}

/// Filter, correct and transform every component on the board.
///
/// Returns the records in board order plus the references that were
/// dropped for being on an unrecognised layer.
pub fn placement_records(
    board: &dyn BoardSource,
    config: &PlacementConfig,
) -> (Vec<PlacementRecord>, Vec<String>) {
    let format = &config.format;
    let mut records = Vec::new();
    let mut dropped = Vec::new();

    for comp in board.components() {
        if config.ignore.skips(&comp.ref_) {
            continue;
        }

        let side = match comp.layer.side() {
            Some(side) => side,
            None => {
                warn!(
                    "dropping {} ({}): not on a top or bottom copper layer ({})",
                    comp.ref_,
                    comp.footprint_name,
                    comp.layer.name()
                );
                dropped.push(comp.ref_.clone());
                continue;
            }
        };

        let (center, rotation) = config.corrections.correct(
            &comp.ref_,
            &comp.footprint_name,
            format.to_mm(comp.position),
            comp.rotation,
            format.flip_y,
        );

        records.push(PlacementRecord {
            ref_: comp.ref_.clone(),
            center,
            side,
            rotation,
        });
    }

    (records, dropped)
}

/// Render the CSV file for one side.
pub fn render_side(
    records: &[PlacementRecord],
    format: &TargetFormat,
    side: Side,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv_writer();
    writer.write_record(format.header())?;
    for record in records.iter().filter(|r| r.side == side) {
        writer.write_record(format.row(record))?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Write the top and bottom placement files for a board.
pub fn export_placement(
    board: &dyn BoardSource,
    config: &PlacementConfig,
) -> Result<PlacementOutput, ExportError> {
    let (records, dropped) = placement_records(board, config);

    // render both before touching the filesystem
    let top = render_side(&records, &config.format, Side::Top)?;
    let bottom = render_side(&records, &config.format, Side::Bottom)?;

    let base = config
        .output_base
        .clone()
        .unwrap_or_else(|| board.file_name().with_extension(""));
    let top_path = output_path(&base, config.format.top_suffix);
    let bottom_path = output_path(&base, config.format.bottom_suffix);

    std::fs::write(&bottom_path, bottom)?;
    std::fs::write(&top_path, top)?;

    let top_count = records.iter().filter(|r| r.side == Side::Top).count();
    let bottom_count = records.len() - top_count;
    info!(
        "wrote {top_count} top and {bottom_count} bottom placements ({} format)",
        config.format.name
    );

    Ok(PlacementOutput {
        top_path,
        bottom_path,
        top_count,
        bottom_count,
        dropped,
    })
}
