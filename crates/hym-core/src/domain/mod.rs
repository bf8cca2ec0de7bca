pub mod errors;

pub use errors::{Failure, HymError, HymErrorCategory, HymResult};

use std::fmt::{Display, Formatter};

/// Logical (ghost-stripped) mesh extents in axial, radial, azimuthal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshDims {
    pub axial: usize,
    pub radial: usize,
    pub azimuthal: usize,
}

impl MeshDims {
    pub const fn new(axial: usize, radial: usize, azimuthal: usize) -> Self {
        Self {
            axial,
            radial,
            azimuthal,
        }
    }

    pub const fn as_array(self) -> [usize; 3] {
        [self.axial, self.radial, self.azimuthal]
    }

    pub const fn cell_count(self) -> usize {
        self.axial * self.radial * self.azimuthal
    }

    /// Number of cells in one azimuthal layer.
    pub const fn layer_len(self) -> usize {
        self.axial * self.radial
    }

    /// Linear index with the axial index running fastest.
    pub const fn index(self, i: usize, j: usize, k: usize) -> usize {
        k * self.radial * self.axial + j * self.axial + i
    }

    pub const fn with_azimuthal(self, azimuthal: usize) -> Self {
        Self {
            azimuthal,
            ..self
        }
    }

    pub const fn is_empty(self) -> bool {
        self.axial == 0 || self.radial == 0 || self.azimuthal == 0
    }
}

impl Display for MeshDims {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:3},{:3},{:3})",
            self.axial, self.radial, self.azimuthal
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldArity {
    Scalar,
    Vector,
}

impl FieldArity {
    pub const fn values_per_cell(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector => 3,
        }
    }

    pub const fn from_values_per_cell(values: usize) -> Option<Self> {
        match values {
            1 => Some(Self::Scalar),
            3 => Some(Self::Vector),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Vector => "vector",
        }
    }
}

pub const FIELD_COUNT: usize = 5;

/// The five simulation outputs the converter knows about, in flag order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Pressure,
    Density,
    MagneticField,
    Velocity,
    CurrentDensity,
}

impl FieldKind {
    pub const ALL: [FieldKind; FIELD_COUNT] = [
        Self::Pressure,
        Self::Density,
        Self::MagneticField,
        Self::Velocity,
        Self::CurrentDensity,
    ];

    pub const fn slot(self) -> usize {
        match self {
            Self::Pressure => 0,
            Self::Density => 1,
            Self::MagneticField => 2,
            Self::Velocity => 3,
            Self::CurrentDensity => 4,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Self::Pressure => 'p',
            Self::Density => 'n',
            Self::MagneticField => 'B',
            Self::Velocity => 'v',
            Self::CurrentDensity => 'J',
        }
    }

    pub const fn arity(self) -> FieldArity {
        match self {
            Self::Pressure | Self::Density => FieldArity::Scalar,
            Self::MagneticField | Self::Velocity | Self::CurrentDensity => FieldArity::Vector,
        }
    }

    pub const fn source_file(self) -> &'static str {
        match self {
            Self::Pressure => "h3ds.d",
            Self::Density => "h3ds_ff.d",
            Self::MagneticField => "h3db.d",
            Self::Velocity => "h3dv.d",
            Self::CurrentDensity => "h3dj.d",
        }
    }

    pub const fn variable_name(self) -> &'static str {
        match self {
            Self::Pressure => "pressure",
            Self::Density => "density",
            Self::MagneticField => "b_field",
            Self::Velocity => "velocity",
            Self::CurrentDensity => "current_density",
        }
    }

    pub const fn component_names(self) -> Option<[&'static str; 3]> {
        match self {
            Self::Pressure | Self::Density => None,
            Self::MagneticField => Some(["B_x", "B_y", "B_z"]),
            Self::Velocity => Some(["v_x", "v_y", "v_z"]),
            Self::CurrentDensity => Some(["J_x", "J_y", "J_z"]),
        }
    }

    pub const fn ascii_prefix(self) -> &'static str {
        match self {
            Self::Pressure => "p3out",
            Self::Density => "n3out",
            Self::MagneticField => "b3out",
            Self::Velocity => "v3out",
            Self::CurrentDensity => "j3out",
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One field's logical values for a single cycle.
///
/// Vector components are stored in the source order: axial, radial,
/// azimuthal.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Scalar(Vec<f32>),
    Vector([Vec<f32>; 3]),
}

impl FieldData {
    pub fn arity(&self) -> FieldArity {
        match self {
            Self::Scalar(_) => FieldArity::Scalar,
            Self::Vector(_) => FieldArity::Vector,
        }
    }

    pub fn components(&self) -> Vec<&[f32]> {
        match self {
            Self::Scalar(values) => vec![values.as_slice()],
            Self::Vector(values) => values.iter().map(Vec::as_slice).collect(),
        }
    }
}

/// Which fields the user asked to convert, in [`FieldKind::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldSelection {
    flags: [bool; FIELD_COUNT],
}

impl FieldSelection {
    pub const fn all() -> Self {
        Self {
            flags: [true; FIELD_COUNT],
        }
    }

    /// Parses a flag string such as `"11010"`.
    pub fn parse(flags: &str) -> HymResult<Self> {
        let chars = flags.chars().collect::<Vec<_>>();
        if chars.len() != FIELD_COUNT {
            return Err(HymError::new(
                Failure::DataFlags,
                format!(
                    "data flags must have length {}, received '{}'",
                    FIELD_COUNT, flags
                ),
            ));
        }

        let mut parsed = [false; FIELD_COUNT];
        for (slot, flag) in chars.into_iter().enumerate() {
            parsed[slot] = match flag {
                '1' => true,
                '0' => false,
                other => {
                    return Err(HymError::new(
                        Failure::DataFlags,
                        format!(
                            "improper data flag '{}' in slot {}; flags must be 0 or 1",
                            other, slot
                        ),
                    ));
                }
            };
        }

        Ok(Self { flags: parsed })
    }

    pub const fn is_selected(&self, kind: FieldKind) -> bool {
        self.flags[kind.slot()]
    }

    pub fn selected(&self) -> impl Iterator<Item = FieldKind> + '_ {
        FieldKind::ALL
            .into_iter()
            .filter(|kind| self.is_selected(*kind))
    }

    pub fn is_empty(&self) -> bool {
        self.flags.iter().all(|flag| !flag)
    }
}

impl Display for FieldSelection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for flag in self.flags {
            f.write_str(if flag { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSelection {
    All,
    Single(usize),
}

impl CycleSelection {
    /// Cycle `0` selects every cycle.
    pub const fn from_requested(cycle: usize) -> Self {
        if cycle == 0 {
            Self::All
        } else {
            Self::Single(cycle)
        }
    }

    pub fn cycles(self, cycle_count: usize) -> HymResult<Vec<usize>> {
        match self {
            Self::All => Ok((1..=cycle_count).collect()),
            Self::Single(cycle) if (1..=cycle_count).contains(&cycle) => Ok(vec![cycle]),
            Self::Single(cycle) => Err(HymError::new(
                Failure::CycleSelection,
                format!(
                    "requested cycle {} is not valid; it must be 0 or in the range [1,{}]",
                    cycle, cycle_count
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CycleSelection, FieldArity, FieldKind, FieldSelection, MeshDims};

    #[test]
    fn linear_index_runs_axial_fastest() {
        let dims = MeshDims::new(4, 3, 2);
        assert_eq!(dims.index(0, 0, 0), 0);
        assert_eq!(dims.index(1, 0, 0), 1);
        assert_eq!(dims.index(0, 1, 0), 4);
        assert_eq!(dims.index(0, 0, 1), 12);
        assert_eq!(dims.index(3, 2, 1), dims.cell_count() - 1);
    }

    #[test]
    fn arity_accepts_only_scalar_and_vector_widths() {
        assert_eq!(FieldArity::from_values_per_cell(1), Some(FieldArity::Scalar));
        assert_eq!(FieldArity::from_values_per_cell(3), Some(FieldArity::Vector));
        assert_eq!(FieldArity::from_values_per_cell(2), None);
    }

    #[test]
    fn field_table_is_ordered_by_flag_slot() {
        let letters = FieldKind::ALL
            .iter()
            .map(|kind| kind.letter())
            .collect::<String>();
        assert_eq!(letters, "pnBvJ");
        for (slot, kind) in FieldKind::ALL.iter().enumerate() {
            assert_eq!(kind.slot(), slot);
        }
        assert_eq!(FieldKind::Velocity.component_names(), Some(["v_x", "v_y", "v_z"]));
        assert!(FieldKind::Density.component_names().is_none());
    }

    #[test]
    fn selection_parses_flag_strings() {
        let selection = FieldSelection::parse("10100").expect("flags should parse");
        let selected = selection.selected().collect::<Vec<_>>();
        assert_eq!(selected, vec![FieldKind::Pressure, FieldKind::MagneticField]);
        assert_eq!(selection.to_string(), "10100");

        let error = FieldSelection::parse("1010").expect_err("short flags are rejected");
        assert_eq!(error.placeholder(), "INPUT.DATA_FLAGS");
        let error = FieldSelection::parse("10201").expect_err("non-binary flags are rejected");
        assert!(error.message().contains("slot 2"));
    }

    #[test]
    fn cycle_zero_selects_every_cycle_in_order() {
        let cycles = CycleSelection::from_requested(0)
            .cycles(4)
            .expect("all cycles should resolve");
        assert_eq!(cycles, vec![1, 2, 3, 4]);
        assert_eq!(
            CycleSelection::from_requested(3).cycles(4).expect("in range"),
            vec![3]
        );
        let error = CycleSelection::from_requested(5)
            .cycles(4)
            .expect_err("out of range single cycle is fatal");
        assert_eq!(error.placeholder(), "INPUT.CYCLE_SELECTION");
    }
}
