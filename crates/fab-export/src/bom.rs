use crate::error::ExportError;
use crate::filter::RefFilter;
use crate::parsers::kicad::{lib_item_name, KicadBoard};
use crate::parsers::netlist::{self, NetlistComponent};
use crate::types::*;
use crate::{csv_writer, output_path};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const BOM_HEADER: [&str; 4] = ["Comment", "Designator", "Footprint", "LCSC Part #"];

/// Manufacturer part numbers that mark a component as not fitted.
const DNP_MARKERS: &[&str] = &["dnp", "do not populate"];

/// Configuration for BOM generation.
#[derive(Debug, Clone)]
pub struct BomConfig {
    /// References to skip (e.g. test points).
    pub ignore: RefFilter,
    /// Netlist field holding the manufacturer part number.
    pub mpn_field: String,
    /// Netlist field holding the assembler's part/footprint label.
    pub label_field: String,
    /// Netlist field holding the marketplace stock code.
    pub stock_field: String,
}

impl Default for BomConfig {
    fn default() -> Self {
        Self {
            ignore: RefFilter::bom_default(),
            mpn_field: "MPN".to_string(),
            label_field: "JLC".to_string(),
            stock_field: "LCSC".to_string(),
        }
    }
}

/// A netlist component that made it into the BOM.
#[derive(Debug, Clone, PartialEq)]
pub struct BomPart {
    pub ref_: String,
    pub value: String,
    pub footprint: String,
    pub mpn: String,
    pub label: String,
    pub stock_code: String,
}

/// Parts sharing a (value, footprint, stock code) key.
#[derive(Debug, Clone, PartialEq)]
pub struct BomGroup {
    pub parts: Vec<BomPart>,
}

impl BomGroup {
    /// The first part seen; its fields describe the whole group.
    pub fn representative(&self) -> &BomPart {
        &self.parts[0]
    }

    pub fn designators(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.ref_.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn row(&self) -> [String; 4] {
        let rep = self.representative();
        let label = if rep.label.is_empty() {
            lib_item_name(&rep.footprint).to_string()
        } else {
            rep.label.clone()
        };
        [rep.value.clone(), self.designators(), label, rep.stock_code.clone()]
    }
}

/// Top and bottom BOMs, groups in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BomData {
    pub top: Vec<BomGroup>,
    pub bottom: Vec<BomGroup>,
}

/// Group netlist components by part key and split them by board side.
///
/// `layers` maps each reference to its copper layer on the board. A
/// reference that is in the netlist but not on the board is an error.
pub fn generate_bom(
    components: &[NetlistComponent],
    layers: &HashMap<&str, &CopperLayer>,
    config: &BomConfig,
) -> Result<BomData, ExportError> {
    let mut top = Grouper::default();
    let mut bottom = Grouper::default();

    for comp in components {
        if config.ignore.skips(&comp.ref_) {
            continue;
        }

        let mpn = comp.field(&config.mpn_field).unwrap_or("");
        if DNP_MARKERS.iter().any(|m| mpn.eq_ignore_ascii_case(m)) {
            debug!("skipping {}: marked '{mpn}'", comp.ref_);
            continue;
        }

        let value = required(comp.value.as_deref(), &comp.ref_, "value")?;
        let footprint = required(comp.footprint.as_deref(), &comp.ref_, "footprint")?;

        let layer = layers
            .get(comp.ref_.as_str())
            .ok_or_else(|| ExportError::MissingOnBoard(comp.ref_.clone()))?;

        let part = BomPart {
            ref_: comp.ref_.clone(),
            value: value.to_string(),
            footprint: footprint.to_string(),
            mpn: mpn.to_string(),
            label: comp.field(&config.label_field).unwrap_or("").to_string(),
            stock_code: comp.field(&config.stock_field).unwrap_or("").to_string(),
        };

        match layer.side() {
            Some(Side::Top) => top.push(part),
            Some(Side::Bottom) => bottom.push(part),
            None => warn!(
                "dropping {} from BOM: not on a top or bottom copper layer ({})",
                comp.ref_,
                layer.name()
            ),
        }
    }

    Ok(BomData {
        top: top.groups,
        bottom: bottom.groups,
    })
}

fn required<'a>(field: Option<&'a str>, reference: &str, name: &str) -> Result<&'a str, ExportError> {
    field.ok_or_else(|| ExportError::MissingField {
        reference: reference.to_string(),
        field: name.to_string(),
    })
}

/// Insertion-ordered grouping by (value, footprint, stock code).
#[derive(Default)]
struct Grouper {
    index: HashMap<(String, String, String), usize>,
    groups: Vec<BomGroup>,
}

impl Grouper {
    fn push(&mut self, part: BomPart) {
        let key = (
            part.value.clone(),
            part.footprint.clone(),
            part.stock_code.clone(),
        );
        match self.index.get(&key) {
            Some(&i) => self.groups[i].parts.push(part),
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push(BomGroup { parts: vec![part] });
            }
        }
    }
}

pub fn render_bom(groups: &[BomGroup]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv_writer();
    writer.write_record(BOM_HEADER)?;
    for group in groups {
        writer.write_record(group.row())?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// What a BOM export wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct BomOutput {
    pub top_path: PathBuf,
    pub bottom_path: PathBuf,
    pub top_rows: usize,
    pub bottom_rows: usize,
}

/// Board file that goes with a netlist: same stem, `.kicad_pcb`.
pub fn board_path_for(netlist_path: &Path) -> PathBuf {
    netlist_path.with_extension("kicad_pcb")
}

/// Read a netlist and its board, then write `<out>_bom_top.csv` and
/// `<out>_bom_bot.csv`.
pub fn export_bom(
    netlist_path: &Path,
    board_path: &Path,
    out_base: &Path,
    config: &BomConfig,
) -> Result<BomOutput, ExportError> {
    let components = netlist::parse(&std::fs::read(netlist_path)?)?;
    let board = KicadBoard::load(board_path)?;
    let bom = generate_bom(&components, &board.layer_map(), config)?;

    let top = render_bom(&bom.top)?;
    let bottom = render_bom(&bom.bottom)?;

    let top_path = output_path(out_base, "_bom_top.csv");
    let bottom_path = output_path(out_base, "_bom_bot.csv");
    std::fs::write(&top_path, top)?;
    std::fs::write(&bottom_path, bottom)?;

    info!(
        "wrote {} top and {} bottom BOM rows",
        bom.top.len(),
        bom.bottom.len()
    );

    Ok(BomOutput {
        top_path,
        bottom_path,
        top_rows: bom.top.len(),
        bottom_rows: bom.bottom.len(),
    })
}
