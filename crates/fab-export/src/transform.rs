use crate::types::{round_f64, PlacementRecord};

/// Decimal places kept for coordinates and rotations in output files.
const OUTPUT_PLACES: u32 = 6;

/// Normalise an angle in degrees into [0, 360).
pub fn normalize_rotation(degrees: f64) -> f64 {
    let r = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Rotate a local-frame offset vector counter-clockwise by `angle_deg`.
pub fn rotate_offset(offset: [f64; 2], angle_deg: f64) -> [f64; 2] {
    if angle_deg == 0.0 {
        return offset;
    }
    let (sin_a, cos_a) = angle_deg.to_radians().sin_cos();
    [
        offset[0] * cos_a - offset[1] * sin_a,
        offset[0] * sin_a + offset[1] * cos_a,
    ]
}

/// Column layout of a placement file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Columns {
    /// `Designator, Mid X, Mid Y, Layer, Rotation`
    Jlc,
    /// `Ref, PosX, PosY, Rot, Side`
    Pos,
}

/// Everything that differs between assembler placement formats.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFormat {
    pub name: &'static str,
    pub columns: Columns,
    /// Board-native units per millimetre.
    pub unit_divisor: f64,
    /// Negate Y: the board is Y-down, the assembler expects Y-up.
    pub flip_y: bool,
    pub coord_suffix: &'static str,
    pub top_suffix: &'static str,
    pub bottom_suffix: &'static str,
}

impl TargetFormat {
    pub fn jlc() -> Self {
        Self {
            name: "jlc",
            columns: Columns::Jlc,
            unit_divisor: 1_000_000.0,
            flip_y: true,
            coord_suffix: "mm",
            top_suffix: "_cpl_top.csv",
            bottom_suffix: "_cpl_bot.csv",
        }
    }

    pub fn pos() -> Self {
        Self {
            name: "pos",
            columns: Columns::Pos,
            unit_divisor: 1_000_000.0,
            flip_y: false,
            coord_suffix: "",
            top_suffix: "_pos_top.csv",
            bottom_suffix: "_pos_bot.csv",
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "jlc" => Some(Self::jlc()),
            "pos" => Some(Self::pos()),
            _ => None,
        }
    }

    pub fn with_unit_divisor(mut self, divisor: f64) -> Self {
        self.unit_divisor = divisor;
        self
    }

    pub fn header(&self) -> [&'static str; 5] {
        match self.columns {
            Columns::Jlc => ["Designator", "Mid X", "Mid Y", "Layer", "Rotation"],
            Columns::Pos => ["Ref", "PosX", "PosY", "Rot", "Side"],
        }
    }

    /// Board-native position to millimetres in this format's axis convention.
    pub fn to_mm(&self, position: [i64; 2]) -> [f64; 2] {
        let x = position[0] as f64 / self.unit_divisor;
        let y = position[1] as f64 / self.unit_divisor;
        [x, if self.flip_y { -y } else { y }]
    }

    pub fn row(&self, record: &PlacementRecord) -> [String; 5] {
        let x = self.format_coord(record.center[0]);
        let y = self.format_coord(record.center[1]);
        // rounding can carry 359.9999999 up to 360
        let rot = format_number(normalize_rotation(round_f64(record.rotation, OUTPUT_PLACES)));
        let side = record.side.as_str().to_string();
        match self.columns {
            Columns::Jlc => [record.ref_.clone(), x, y, side, rot],
            Columns::Pos => [record.ref_.clone(), x, y, rot, side],
        }
    }

    fn format_coord(&self, mm: f64) -> String {
        format!("{}{}", format_number(mm), self.coord_suffix)
    }
}

fn format_number(v: f64) -> String {
    // adding 0.0 turns -0.0 into 0.0
    format!("{}", round_f64(v, OUTPUT_PLACES) + 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(0.0), 0.0);
        assert_eq!(normalize_rotation(360.0), 0.0);
        assert_eq!(normalize_rotation(450.0), 90.0);
        assert_eq!(normalize_rotation(-90.0), 270.0);
        let tiny = normalize_rotation(-1e-20);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_rotate_offset_quarter_turn() {
        let r = rotate_offset([0.0, -3.81], 90.0);
        assert_abs_diff_eq!(r[0], 3.81, epsilon = 1e-3);
        assert_abs_diff_eq!(r[1], 0.0, epsilon = 1e-3);

        let r = rotate_offset([1.0, 0.0], 180.0);
        assert_abs_diff_eq!(r[0], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_to_mm_axis_convention() {
        let pos = [12_500_000, 40_000_000];
        assert_eq!(TargetFormat::jlc().to_mm(pos), [12.5, -40.0]);
        assert_eq!(TargetFormat::pos().to_mm(pos), [12.5, 40.0]);
        let decinano = TargetFormat::pos().with_unit_divisor(10_000_000.0);
        assert_eq!(decinano.to_mm(pos), [1.25, 4.0]);
    }

    #[test]
    fn test_rows() {
        let record = PlacementRecord {
            ref_: "U1".to_string(),
            center: [12.5, -0.0],
            side: Side::Bottom,
            rotation: 270.0,
        };
        assert_eq!(
            TargetFormat::jlc().row(&record),
            ["U1", "12.5mm", "0mm", "bottom", "270"]
        );
        assert_eq!(
            TargetFormat::pos().row(&record),
            ["U1", "12.5", "0", "270", "bottom"]
        );
    }

    #[test]
    fn test_rotation_near_full_turn_written_as_zero() {
        let record = PlacementRecord {
            ref_: "R1".to_string(),
            center: [1.0, -1.0],
            side: Side::Top,
            rotation: normalize_rotation(359.9999999),
        };
        assert_eq!(
            TargetFormat::jlc().row(&record),
            ["R1", "1mm", "-1mm", "top", "0"]
        );
    }

    #[test]
    fn test_by_name() {
        assert_eq!(TargetFormat::by_name("JLC"), Some(TargetFormat::jlc()));
        assert_eq!(TargetFormat::by_name("pos").map(|f| f.columns), Some(Columns::Pos));
        assert!(TargetFormat::by_name("pnp").is_none());
    }
}
