pub mod bom;
pub mod corrections;
pub mod cpl;
pub mod error;
pub mod filter;
pub mod parsers;
pub mod transform;
pub mod types;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub use bom::{export_bom, BomConfig};
pub use corrections::Corrections;
pub use cpl::{export_placement, PlacementConfig};
pub use error::ExportError;
pub use filter::RefFilter;
pub use parsers::kicad::{BoardSource, KicadBoard};
pub use transform::TargetFormat;

/// `base` with `suffix` appended to its file name
/// (`board` + `_cpl_top.csv` → `board_cpl_top.csv`).
pub fn output_path(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Quote-everything CSV writer with CRLF line endings.
pub(crate) fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("/boards/demo"), "_cpl_top.csv"),
            PathBuf::from("/boards/demo_cpl_top.csv")
        );
        assert_eq!(
            output_path(Path::new("/boards/demo.kicad_pcb").with_extension("").as_path(), "_bom_bot.csv"),
            PathBuf::from("/boards/demo_bom_bot.csv")
        );
    }
}
