use super::TranscribeError;
use crate::common::constants::PI;
use crate::domain::MeshDims;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How the azimuthal axis is extended before storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "camelCase")]
pub enum ClosurePolicy {
    /// Wraps the seam: `ghost_layers` copies of the opposite edge on each
    /// side plus one seam layer repeating the first interior layer.
    Periodic {
        #[serde(rename = "ghostLayers", default)]
        ghost_layers: usize,
    },
    /// The run covers half the azimuth; one layer repeating the first
    /// interior layer is appended at azimuth `phi_0 + pi`.
    HalfDomainMirror,
}

impl Default for ClosurePolicy {
    fn default() -> Self {
        Self::Periodic { ghost_layers: 0 }
    }
}

impl ClosurePolicy {
    /// Boundary ghost layers on each side of the closed axis.
    pub const fn ghost_layers(self) -> usize {
        match self {
            Self::Periodic { ghost_layers } => ghost_layers,
            Self::HalfDomainMirror => 0,
        }
    }

    /// The one appended layer that closes the mesh. It holds real nodes,
    /// so it is not reported as a ghost layer.
    pub const fn seam_layers(self) -> usize {
        1
    }

    pub const fn lo_layers(self) -> usize {
        self.ghost_layers()
    }

    /// Layers after the last logical layer: the seam, then the ghosts.
    pub const fn hi_layers(self) -> usize {
        self.seam_layers() + self.ghost_layers()
    }

    pub const fn closed_extent(self, azimuthal: usize) -> usize {
        azimuthal + self.lo_layers() + self.hi_layers()
    }

    /// Closed-array indices holding the logical layers.
    pub const fn interior(self, azimuthal: usize) -> Range<usize> {
        self.lo_layers()..self.lo_layers() + azimuthal
    }

    pub fn check_extent(self, azimuthal: usize) -> Result<(), TranscribeError> {
        if azimuthal == 0 || azimuthal < self.hi_layers() {
            return Err(TranscribeError::ClosureTooWide {
                azimuthal,
                required: self.hi_layers().max(1),
            });
        }
        Ok(())
    }
}

/// Applies `policy` to `values`, viewed as `layers` azimuthal layers of
/// `layer_len` entries each.
pub(super) fn close_layers<T: Copy>(
    values: &[T],
    layer_len: usize,
    layers: usize,
    policy: ClosurePolicy,
) -> Vec<T> {
    let layer = |k: usize| &values[k * layer_len..(k + 1) * layer_len];
    let mut closed = Vec::with_capacity(policy.closed_extent(layers) * layer_len);
    for k in layers - policy.lo_layers()..layers {
        closed.extend_from_slice(layer(k));
    }
    closed.extend_from_slice(values);
    for k in 0..policy.hi_layers() {
        closed.extend_from_slice(layer(k));
    }
    closed
}

/// Extends one field component in azimuth according to `policy`.
pub fn close_azimuth(
    values: &[f32],
    dims: MeshDims,
    policy: ClosurePolicy,
) -> Result<Vec<f32>, TranscribeError> {
    if values.len() != dims.cell_count() {
        return Err(TranscribeError::DimensionMismatch {
            expected: dims.cell_count(),
            actual: values.len(),
        });
    }
    policy.check_extent(dims.azimuthal)?;
    Ok(close_layers(values, dims.layer_len(), dims.azimuthal, policy))
}

/// Closes the azimuthal coordinate vector the same way as the fields.
pub fn close_coordinates(
    azimuthal: &[f32],
    policy: ClosurePolicy,
) -> Result<Vec<f32>, TranscribeError> {
    policy.check_extent(azimuthal.len())?;
    let mut closed = close_layers(azimuthal, 1, azimuthal.len(), policy);
    if policy == ClosurePolicy::HalfDomainMirror
        && let Some(last) = closed.last_mut()
    {
        *last = (f64::from(azimuthal[0]) + PI) as f32;
    }
    Ok(closed)
}

/// Removes the closure layers again, returning `azimuthal` logical layers.
pub fn open_azimuth(
    values: &[f32],
    layer_len: usize,
    lo_layers: usize,
    azimuthal: usize,
) -> Result<Vec<f32>, TranscribeError> {
    let start = lo_layers * layer_len;
    let end = start + azimuthal * layer_len;
    values
        .get(start..end)
        .map(<[f32]>::to_vec)
        .ok_or(TranscribeError::DimensionMismatch {
            expected: end,
            actual: values.len(),
        })
}
