//! Per-footprint rotation and origin corrections.
//!
//! Footprint libraries do not always agree with the assembler on what
//! "rotation 0" or "part origin" means. Two ordered tables fix that up:
//! every rule whose pattern matches the start of the footprint name
//! applies, in declaration order.

use crate::error::ExportError;
use crate::transform::{normalize_rotation, rotate_offset};
use crate::types::round_f64;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RotationRule {
    pub pattern: String,
    pub degrees: i32,
}

/// Offset from the footprint origin to the part centre, in millimetres,
/// in the footprint's unrotated frame with Y pointing up.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OffsetRule {
    pub pattern: String,
    pub x: f64,
    pub y: f64,
}

/// Correction tables as written in a JSON config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CorrectionConfig {
    #[serde(default)]
    pub rotations: Vec<RotationRule>,
    #[serde(default)]
    pub offsets: Vec<OffsetRule>,
}

impl CorrectionConfig {
    /// Built-in tables for JLC-style assembly.
    pub fn builtin() -> Self {
        let rotations = [
            ("^SOT-223", 180),
            ("^SOT-23", 180),
            ("^SOT-353", 180),
            ("^QFN-", 270),
            ("^LQFP-", 90),
            ("^TQFP-", 270),
            // any SOP except SOP-18_
            ("^SOP-(?:$|[^1]|1(?:$|[^8])|18(?:$|[^_]))", 270),
            ("^TSSOP-", 270),
            ("^DFN-", 270),
            ("^SOIC-", 90),
            ("^SOP-18_", 0),
            ("^VSSOP-10_", 270),
            ("^CP_EIA-3216-18_", 180),
            ("^CP_Elec_8x10.5", 180),
            ("^CP_Elec_6.3x7.7", 180),
            ("^CP_Elec_8x6.7", 180),
            ("^(.*?_|V)?QFN-(16|20|24|28|40)(-|_|$)", 270),
            ("^MSOP-10_", 90),
            ("^R_Array_Convex_4x0603", 90),
            ("^Pin(Socket|Header)_1x\\d+_P2.54mm_Vertical", 270),
        ];

        let mut offsets = Vec::new();
        for pins in 2..=10u32 {
            let half_span = f64::from(pins - 1) * 2.54 / 2.0;
            for kind in ["PinSocket", "PinHeader"] {
                offsets.push(OffsetRule {
                    pattern: format!("^{kind}_1x{pins:02}_P2.54mm_Vertical"),
                    x: 0.0,
                    y: -round_f64(half_span, 3),
                });
            }
        }

        Self {
            rotations: rotations
                .into_iter()
                .map(|(pattern, degrees)| RotationRule {
                    pattern: pattern.to_string(),
                    degrees,
                })
                .collect(),
            offsets,
        }
    }
}

/// Compiled, immutable correction tables.
#[derive(Debug, Clone)]
pub struct Corrections {
    rotations: Vec<(Regex, i32)>,
    offsets: Vec<(Regex, [f64; 2])>,
}

impl Corrections {
    pub fn compile(config: &CorrectionConfig) -> Result<Self, ExportError> {
        let rotations = config
            .rotations
            .iter()
            .map(|r| anchored(&r.pattern).map(|re| (re, r.degrees)))
            .collect::<Result<Vec<_>, _>>()?;
        let offsets = config
            .offsets
            .iter()
            .map(|o| anchored(&o.pattern).map(|re| (re, [o.x, o.y])))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rotations, offsets })
    }

    pub fn builtin() -> Result<Self, ExportError> {
        Self::compile(&CorrectionConfig::builtin())
    }

    pub fn from_json(data: &[u8]) -> Result<Self, ExportError> {
        let config: CorrectionConfig = serde_json::from_slice(data)?;
        Self::compile(&config)
    }

    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }

    /// Apply every matching rule to a component's centre and rotation.
    ///
    /// `center` is in millimetres; `y_up` says whether its Y axis points
    /// up (offsets are defined Y-up and get mirrored otherwise). Offsets
    /// are rotated by the reported rotation, before any rotation rule
    /// runs. The returned rotation is in [0, 360).
    pub fn correct(
        &self,
        reference: &str,
        footprint: &str,
        center: [f64; 2],
        rotation: f64,
        y_up: bool,
    ) -> ([f64; 2], f64) {
        let mut center = center;
        for (re, offset) in &self.offsets {
            if !re.is_match(footprint) {
                continue;
            }
            let rotated = rotate_offset(*offset, rotation);
            let dx = round_f64(rotated[0], 3);
            let dy = round_f64(rotated[1], 3);
            let dy = if y_up { dy } else { -dy };
            debug!(
                "offsetting {reference} ({footprint}): prev {:?}, by ({dx}, {dy})",
                center
            );
            center = [center[0] + dx, center[1] + dy];
        }

        let mut rot = normalize_rotation(rotation);
        for (re, degrees) in &self.rotations {
            if !re.is_match(footprint) {
                continue;
            }
            let new_rot = normalize_rotation(rot + f64::from(*degrees));
            debug!("rotating {reference} ({footprint}): prev {rot}, new {new_rot}");
            rot = new_rot;
        }

        (center, rot)
    }
}

/// Compile a pattern so it only matches at the start of the name.
fn anchored(pattern: &str) -> Result<Regex, ExportError> {
    Regex::new(&format!(r"\A(?:{pattern})")).map_err(|source| ExportError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tables(json: &str) -> Corrections {
        Corrections::from_json(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_anchored_prefix_semantics() {
        let c = Corrections::builtin().unwrap();
        let (_, rot) = c.correct("U1", "SOT-23-6", [0.0, 0.0], 0.0, true);
        assert_eq!(rot, 180.0);

        // substring match is not enough
        let (_, rot) = c.correct("U2", "Package_SOT-23-6", [0.0, 0.0], 0.0, true);
        assert_eq!(rot, 0.0);
    }

    #[test]
    fn test_sot223_only_matches_its_own_rule() {
        let c = tables(r#"{"rotations": [
            {"pattern": "^SOT-223", "degrees": 90},
            {"pattern": "^SOT-23", "degrees": 180}
        ]}"#);
        let (_, rot) = c.correct("U1", "SOT-23-6", [0.0, 0.0], 0.0, true);
        assert_eq!(rot, 180.0);
        let (_, rot) = c.correct("U2", "SOT-223-3_TabPin2", [0.0, 0.0], 0.0, true);
        assert_eq!(rot, 90.0);
    }

    #[test]
    fn test_sop_exclusion() {
        let c = Corrections::builtin().unwrap();
        let (_, rot) = c.correct("U1", "SOP-8_3.9x4.9mm_P1.27mm", [0.0, 0.0], 0.0, true);
        assert_eq!(rot, 270.0);
        let (_, rot) = c.correct("U2", "SOP-18_7.0x12.5mm_P1.27mm", [0.0, 0.0], 0.0, true);
        assert_eq!(rot, 0.0);
        let (_, rot) = c.correct("U3", "SOP-16_3.9x9.9mm_P1.27mm", [0.0, 0.0], 0.0, true);
        assert_eq!(rot, 270.0);
    }

    #[test]
    fn test_rotation_rules_stack_mod_360() {
        let c = tables(r#"{"rotations": [
            {"pattern": "^QFN-", "degrees": 270},
            {"pattern": "^QFN-32", "degrees": 180}
        ]}"#);
        let (_, rot) = c.correct("U1", "QFN-32-1EP_5x5mm", [0.0, 0.0], 90.0, true);
        // 90 + 270 = 0, then + 180
        assert_eq!(rot, 180.0);
    }

    #[test]
    fn test_no_match_passes_through() {
        let c = Corrections::builtin().unwrap();
        let (center, rot) = c.correct("R1", "R_0603_1608Metric", [12.5, -3.25], 450.0, true);
        assert_eq!(center, [12.5, -3.25]);
        assert_eq!(rot, 90.0);
    }

    #[test]
    fn test_pin_socket_offset_and_rotation() {
        let c = tables(r#"{
            "rotations": [{"pattern": "^PinSocket_1x04_P2.54mm_Vertical", "degrees": 270}],
            "offsets": [{"pattern": "^PinSocket_1x04_P2.54mm_Vertical", "x": 0.0, "y": -3.81}]
        }"#);
        let (center, rot) = c.correct(
            "J1",
            "PinSocket_1x04_P2.54mm_Vertical",
            [10.0, -20.0],
            90.0,
            true,
        );
        assert_abs_diff_eq!(center[0], 13.81, epsilon = 1e-3);
        assert_abs_diff_eq!(center[1], -20.0, epsilon = 1e-3);
        assert_eq!(rot, 0.0);
    }

    #[test]
    fn test_offsets_are_cumulative_in_table_order() {
        let c = tables(r#"{"offsets": [
            {"pattern": "^Generic", "x": 1.0, "y": 0.0},
            {"pattern": "^Generic_Special", "x": 0.0, "y": 2.0}
        ]}"#);
        let (center, _) = c.correct("X1", "Generic_Special", [0.0, 0.0], 0.0, true);
        // both apply, not just the last one
        assert_eq!(center, [1.0, 2.0]);

        let (center, _) = c.correct("X2", "Generic_Plain", [0.0, 0.0], 0.0, true);
        assert_eq!(center, [1.0, 0.0]);
    }

    #[test]
    fn test_offset_mirrored_for_y_down_output() {
        let c = tables(r#"{"offsets": [{"pattern": "^A", "x": 0.0, "y": -1.27}]}"#);
        let (center, _) = c.correct("X1", "A", [0.0, 5.0], 0.0, false);
        assert_eq!(center[0], 0.0);
        assert_abs_diff_eq!(center[1], 6.27, epsilon = 1e-9);
    }

    #[test]
    fn test_offset_rounded_to_three_places() {
        let c = tables(r#"{"offsets": [{"pattern": "^A", "x": 1.0, "y": 0.0}]}"#);
        let (center, _) = c.correct("X1", "A", [0.0, 0.0], 30.0, true);
        assert_eq!(center, [0.866, 0.5]);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = Corrections::from_json(br#"{"rotations": [{"pattern": "^SOP-(", "degrees": 90}]}"#)
            .unwrap_err();
        match err {
            ExportError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "^SOP-("),
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_builtin_pin_socket_offsets() {
        let config = CorrectionConfig::builtin();
        let rule = config
            .offsets
            .iter()
            .find(|o| o.pattern == "^PinSocket_1x04_P2.54mm_Vertical")
            .unwrap();
        assert_eq!(rule.y, -3.81);
    }
}
