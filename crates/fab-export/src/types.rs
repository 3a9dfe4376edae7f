use std::collections::HashMap;

/// Round a float to N decimal places.
pub fn round_f64(v: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (v * factor).round() / factor
}

// ─── Layers ──────────────────────────────────────────────────────────

/// Copper layer a component is mounted on, as reported by the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopperLayer {
    Top,
    Bottom,
    Other(String),
}

impl CopperLayer {
    pub fn from_name(name: &str) -> Self {
        match name {
            "F.Cu" => CopperLayer::Top,
            "B.Cu" => CopperLayer::Bottom,
            other => CopperLayer::Other(other.to_string()),
        }
    }

    /// The assembly side, or `None` for layers no output file covers.
    pub fn side(&self) -> Option<Side> {
        match self {
            CopperLayer::Top => Some(Side::Top),
            CopperLayer::Bottom => Some(Side::Bottom),
            CopperLayer::Other(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CopperLayer::Top => "F.Cu",
            CopperLayer::Bottom => "B.Cu",
            CopperLayer::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
        }
    }
}

// ─── Component (read-only board snapshot) ────────────────────────────

#[derive(Debug, Clone)]
pub struct Component {
    pub ref_: String,
    pub val: String,
    /// Footprint library item name, without the library nickname.
    pub footprint_name: String,
    pub description: String,
    /// Absolute position in board-native units (nanometres).
    pub position: [i64; 2],
    /// Orientation in degrees as reported by the board.
    pub rotation: f64,
    pub layer: CopperLayer,
    pub extra_fields: HashMap<String, String>,
}

impl Component {
    /// Look up a named extra field (e.g. "MPN", "LCSC").
    pub fn field(&self, name: &str) -> Option<&str> {
        self.extra_fields.get(name).map(String::as_str)
    }
}

// ─── Placement record ────────────────────────────────────────────────

/// One corrected row of a placement file.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRecord {
    pub ref_: String,
    /// Corrected centre in millimetres, in the target format's axis convention.
    pub center: [f64; 2],
    pub side: Side,
    /// Corrected rotation, always in [0, 360).
    pub rotation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_f64() {
        assert_eq!(round_f64(3.8099999999, 3), 3.81);
        assert_eq!(round_f64(-1.23456, 2), -1.23);
    }

    #[test]
    fn test_layer_sides() {
        assert_eq!(CopperLayer::from_name("F.Cu").side(), Some(Side::Top));
        assert_eq!(CopperLayer::from_name("B.Cu").side(), Some(Side::Bottom));
        let inner = CopperLayer::from_name("In1.Cu");
        assert_eq!(inner.side(), None);
        assert_eq!(inner.name(), "In1.Cu");
    }
}
