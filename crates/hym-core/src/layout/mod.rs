//! Binary record geometry of the simulation's per-field output files.
//!
//! Both the validator and the positioned reader in [`crate::store`] take
//! every offset from a [`RecordLayout`], so the two can never disagree.

use crate::common::constants::{
    GHOST_AXIAL, GHOST_AZIMUTHAL, GHOST_RADIAL, INT_BYTES, RECORD_DIM_INTS, RECORD_LEAD_INTS,
    RECORD_TRAILER_BYTES, SAMPLE_BYTES,
};
use crate::domain::{Failure, FieldArity, FieldData, HymError, MeshDims};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("buffer holds {actual} samples but the layout expects {expected}")]
    BufferLength { expected: usize, actual: usize },
    #[error("{arity} record cannot carry {actual} components")]
    ComponentCount { arity: &'static str, actual: usize },
}

impl From<LayoutError> for HymError {
    fn from(error: LayoutError) -> Self {
        HymError::new(Failure::LayoutBuffer, error.to_string())
    }
}

/// Per-axis `(low, high)` ghost cell counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostPadding {
    pub axial: (usize, usize),
    pub radial: (usize, usize),
    pub azimuthal: (usize, usize),
}

impl GhostPadding {
    pub const SOURCE: Self = Self {
        axial: GHOST_AXIAL,
        radial: GHOST_RADIAL,
        azimuthal: GHOST_AZIMUTHAL,
    };

    pub const NONE: Self = Self {
        axial: (0, 0),
        radial: (0, 0),
        azimuthal: (0, 0),
    };

    pub const fn pad(&self, logical: MeshDims) -> MeshDims {
        MeshDims::new(
            self.axial.0 + logical.axial + self.axial.1,
            self.radial.0 + logical.radial + self.radial.1,
            self.azimuthal.0 + logical.azimuthal + self.azimuthal.1,
        )
    }

    /// Logical extents of a padded dimension triple as stored in a record
    /// header, or `None` if any axis is smaller than its padding.
    pub fn strip(&self, padded: [i32; 3]) -> Option<MeshDims> {
        let axis = |value: i32, (lo, hi): (usize, usize)| {
            usize::try_from(value).ok()?.checked_sub(lo + hi)
        };
        Some(MeshDims::new(
            axis(padded[0], self.axial)?,
            axis(padded[1], self.radial)?,
            axis(padded[2], self.azimuthal)?,
        ))
    }

    /// Strips one coordinate axis given its `(low, high)` padding.
    pub fn strip_axis(values: &[f64], (lo, hi): (usize, usize)) -> Vec<f32> {
        if values.len() < lo + hi {
            return Vec::new();
        }
        values[lo..values.len() - hi]
            .iter()
            .map(|value| *value as f32)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    logical: MeshDims,
    padded: MeshDims,
    arity: FieldArity,
    ghosts: GhostPadding,
}

impl RecordLayout {
    pub fn new(logical: MeshDims, arity: FieldArity) -> Self {
        Self::with_ghosts(logical, arity, GhostPadding::SOURCE)
    }

    pub fn with_ghosts(logical: MeshDims, arity: FieldArity, ghosts: GhostPadding) -> Self {
        Self {
            logical,
            padded: ghosts.pad(logical),
            arity,
            ghosts,
        }
    }

    pub const fn logical_dims(&self) -> MeshDims {
        self.logical
    }

    pub const fn padded_dims(&self) -> MeshDims {
        self.padded
    }

    pub const fn arity(&self) -> FieldArity {
        self.arity
    }

    pub const fn ghosts(&self) -> GhostPadding {
        self.ghosts
    }

    pub const fn padded_cell_count(&self) -> usize {
        self.padded.cell_count()
    }

    /// Samples in the data block of one record, all components included.
    pub const fn data_sample_count(&self) -> usize {
        self.padded_cell_count() * self.arity.values_per_cell()
    }

    pub const fn header_bytes(&self) -> u64 {
        ((RECORD_LEAD_INTS + RECORD_DIM_INTS) * INT_BYTES) as u64
    }

    pub const fn byte_size(&self) -> u64 {
        self.header_bytes()
            + ((1 + self.data_sample_count()) * SAMPLE_BYTES) as u64
            + RECORD_TRAILER_BYTES as u64
    }

    /// Number of records that lie entirely inside a file of `file_len` bytes.
    pub const fn complete_cycles(&self, file_len: u64) -> usize {
        (file_len / self.byte_size()) as usize
    }

    /// Byte offset of the start of 1-based `cycle`.
    pub const fn record_offset(&self, cycle: usize) -> u64 {
        (cycle.saturating_sub(1) as u64) * self.byte_size()
    }

    pub const fn time_offset(&self, cycle: usize) -> u64 {
        self.record_offset(cycle) + (RECORD_LEAD_INTS * INT_BYTES) as u64
    }

    pub const fn dims_offset(&self, cycle: usize) -> u64 {
        self.time_offset(cycle) + SAMPLE_BYTES as u64
    }

    pub const fn data_offset(&self, cycle: usize) -> u64 {
        self.dims_offset(cycle) + (RECORD_DIM_INTS * INT_BYTES) as u64
    }

    /// Drops the ghost cells of one padded component.
    pub fn strip_ghosts(&self, padded: &[f64]) -> Result<Vec<f32>, LayoutError> {
        let expected = self.padded_cell_count();
        if padded.len() != expected {
            return Err(LayoutError::BufferLength {
                expected,
                actual: padded.len(),
            });
        }

        let (qlo, qhi) = self.ghosts.axial;
        let (rlo, rhi) = self.ghosts.radial;
        let (slo, shi) = self.ghosts.azimuthal;
        let p = self.padded;

        let mut stripped = Vec::with_capacity(self.logical.cell_count());
        for k in slo..p.azimuthal - shi {
            for j in rlo..p.radial - rhi {
                for i in qlo..p.axial - qhi {
                    stripped.push(padded[p.index(i, j, k)] as f32);
                }
            }
        }
        Ok(stripped)
    }

    /// Embeds one logical component in a padded buffer, filling ghosts.
    pub fn insert_ghosts(&self, logical: &[f32], fill: f64) -> Result<Vec<f64>, LayoutError> {
        let expected = self.logical.cell_count();
        if logical.len() != expected {
            return Err(LayoutError::BufferLength {
                expected,
                actual: logical.len(),
            });
        }

        let l = self.logical;
        let p = self.padded;
        let mut padded = vec![fill; p.cell_count()];
        for k in 0..l.azimuthal {
            for j in 0..l.radial {
                for i in 0..l.axial {
                    let target = p.index(
                        i + self.ghosts.axial.0,
                        j + self.ghosts.radial.0,
                        k + self.ghosts.azimuthal.0,
                    );
                    padded[target] = f64::from(logical[l.index(i, j, k)]);
                }
            }
        }
        Ok(padded)
    }

    /// Serializes one full record; the inverse of what the store reads.
    pub fn encode_record(
        &self,
        step: i32,
        time: f64,
        field: &FieldData,
    ) -> Result<Vec<u8>, LayoutError> {
        self.encode_record_with_dims(step, time, self.padded.as_array(), field)
    }

    /// Like [`Self::encode_record`] but with an explicit header dimension
    /// triple, for producing records that fail validation.
    pub fn encode_record_with_dims(
        &self,
        step: i32,
        time: f64,
        header_dims: [usize; 3],
        field: &FieldData,
    ) -> Result<Vec<u8>, LayoutError> {
        let components = field.components();
        if components.len() != self.arity.values_per_cell() {
            return Err(LayoutError::ComponentCount {
                arity: self.arity.as_str(),
                actual: components.len(),
            });
        }

        let mut bytes = Vec::with_capacity(self.byte_size() as usize);
        let body_len = (self.byte_size() as usize).saturating_sub(2 * INT_BYTES) as i32;
        bytes.extend_from_slice(&body_len.to_le_bytes());
        bytes.extend_from_slice(&step.to_le_bytes());
        bytes.extend_from_slice(&time.to_le_bytes());
        for extent in header_dims {
            bytes.extend_from_slice(&(extent as i32).to_le_bytes());
        }
        for component in components {
            for value in self.insert_ghosts(component, 0.0)? {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        bytes.resize(self.byte_size() as usize, 0);
        Ok(bytes)
    }
}
