/// Reference designator prefixes skipped by the placement exporter
/// (test points, connectors, net ties, switches).
///
/// Connectors are usually hand-soldered, so `J` parts never reach the
/// pin socket/header correction rules unless the list is replaced.
pub const PLACEMENT_IGNORE: &[&str] = &["TP", "J", "NT", "SW"];

/// Reference designator prefixes skipped by the BOM exporter
/// (test points, transformers/terminals, net ties, unannotated parts,
/// logos and mounting holes).
pub const BOM_IGNORE: &[&str] = &["TP", "T", "NT", "REF***", "G", "H"];

/// Case-sensitive reference prefix filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefFilter {
    prefixes: Vec<String>,
}

impl RefFilter {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn placement_default() -> Self {
        Self::new(PLACEMENT_IGNORE.iter().copied())
    }

    pub fn bom_default() -> Self {
        Self::new(BOM_IGNORE.iter().copied())
    }

    /// True if `reference` starts with any configured prefix.
    pub fn skips(&self, reference: &str) -> bool {
        self.prefixes.iter().any(|p| reference.starts_with(p.as_str()))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}
