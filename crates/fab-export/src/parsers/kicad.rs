use crate::error::ExportError;
use crate::parsers::kicad_sexpr::{self, SExpr};
use crate::types::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Board-native units per millimetre (KiCad works in nanometres).
pub const NM_PER_MM: f64 = 1_000_000.0;

/// Read-only view of the components on a board.
///
/// The exporters only ever see a board through this trait, so any host
/// that can enumerate its footprints can drive them.
pub trait BoardSource {
    /// Path of the board document; output files are named after it.
    fn file_name(&self) -> &Path;

    /// Components in board iteration order.
    fn components(&self) -> &[Component];
}

/// A `.kicad_pcb` file loaded from disk.
#[derive(Debug, Clone)]
pub struct KicadBoard {
    path: PathBuf,
    components: Vec<Component>,
}

impl KicadBoard {
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(path, &data)
    }

    /// Parse board contents; `path` is only recorded for output naming.
    pub fn from_bytes(path: &Path, data: &[u8]) -> Result<Self, ExportError> {
        let root = kicad_sexpr::parse(data)
            .map_err(|e| ExportError::Parse(format!("S-expression parse error: {e}")))?;

        if root.tag() != Some("kicad_pcb") {
            return Err(ExportError::Parse(format!(
                "{} is not a kicad_pcb file",
                path.display()
            )));
        }

        // KiCad 5 calls them modules, 6+ footprints; never both in one file.
        let components = root
            .find_all("footprint")
            .chain(root.find_all("module"))
            .map(parse_footprint)
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            components,
        })
    }

    /// Reference → copper layer, for joining against a netlist.
    pub fn layer_map(&self) -> HashMap<&str, &CopperLayer> {
        self.components
            .iter()
            .map(|c| (c.ref_.as_str(), &c.layer))
            .collect()
    }
}

impl BoardSource for KicadBoard {
    fn file_name(&self) -> &Path {
        &self.path
    }

    fn components(&self) -> &[Component] {
        &self.components
    }
}

/// Strip the library nickname from a footprint id ("Lib:Name" → "Name").
pub fn lib_item_name(fpid: &str) -> &str {
    fpid.split_once(':').map_or(fpid, |(_, name)| name)
}

fn mm_to_nm(mm: f64) -> i64 {
    (mm * NM_PER_MM).round() as i64
}

fn get_layer_name(node: &SExpr) -> &str {
    node.value("layer").unwrap_or("")
}

fn parse_footprint(node: &SExpr) -> Component {
    let at_node = node.find("at");
    let fp_x = at_node.and_then(|n| n.f64_at(0)).unwrap_or(0.0);
    let fp_y = at_node.and_then(|n| n.f64_at(1)).unwrap_or(0.0);
    let fp_angle = at_node.and_then(|n| n.f64_at(2)).unwrap_or(0.0);

    let fpid = node.atom_at(0).unwrap_or("");

    let mut ref_ = String::new();
    let mut value = String::new();
    let mut description = node.value("descr").unwrap_or("").to_string();
    let mut extra_fields = HashMap::new();

    for child in node.children() {
        match child.tag() {
            // KiCad 5
            Some("fp_text") => {
                let text = child.atom_at(1).unwrap_or("");
                match child.atom_at(0) {
                    Some("reference") => ref_ = text.to_string(),
                    Some("value") => value = text.to_string(),
                    _ => {}
                }
            }
            // KiCad 6+
            Some("property") => {
                let name = child.atom_at(0).unwrap_or("");
                let text = child.atom_at(1).unwrap_or("");
                match name {
                    "Reference" => ref_ = text.to_string(),
                    "Value" => value = text.to_string(),
                    "Description" => description = text.to_string(),
                    "Footprint" | "Datasheet" | "ki_fp_filters" | "ki_description" => {}
                    _ => {
                        extra_fields.insert(name.to_string(), text.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    Component {
        ref_,
        val: value,
        footprint_name: lib_item_name(fpid).to_string(),
        description,
        position: [mm_to_nm(fp_x), mm_to_nm(fp_y)],
        rotation: fp_angle,
        layer: CopperLayer::from_name(get_layer_name(node)),
        extra_fields,
    }
}
