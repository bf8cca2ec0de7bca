//! Regridding of logical cylindrical fields into the database's storage
//! conventions: azimuthal closure, Cartesian components and zero scrubbing.
//!
//! The mesh is closed once per cycle with [`GridTranscriber::build_mesh`];
//! every field of that cycle is then transcribed against the same
//! [`ClosedMesh`] so node and field extents always agree.

mod closure;
mod vector;

pub use closure::{ClosurePolicy, close_azimuth, close_coordinates, open_azimuth};
pub use vector::{average_axis, cartesian_to_cylindrical, cylindrical_to_cartesian};

use crate::common::constants::ZERO_THRESHOLD;
use crate::domain::{Failure, FieldArity, FieldData, HymError, MeshDims};
use crate::metadata::MeshCoordinates;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscribeError {
    #[error("field holds {actual} values but the mesh expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("{actual} azimuthal angles supplied for {expected} layers")]
    CoordinateMismatch { expected: usize, actual: usize },
    #[error("azimuthal extent {azimuthal} is too small for the closure (needs {required})")]
    ClosureTooWide { azimuthal: usize, required: usize },
}

impl From<TranscribeError> for HymError {
    fn from(error: TranscribeError) -> Self {
        HymError::new(Failure::TranscribeDims, error.to_string())
    }
}

/// Sets every value with magnitude below `threshold` to exactly zero.
pub fn scrub_near_zero(values: &mut [f32], threshold: f32) {
    for value in values.iter_mut().filter(|value| value.abs() < threshold) {
        *value = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscribeOptions {
    pub closure: ClosurePolicy,
    pub axis_average: bool,
    pub zero_threshold: f32,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            closure: ClosurePolicy::default(),
            axis_average: false,
            zero_threshold: ZERO_THRESHOLD,
        }
    }
}

/// Cartesian node coordinates of the azimuthally closed mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedMesh {
    logical: MeshDims,
    closed: MeshDims,
    closure: ClosurePolicy,
    azimuthal: Vec<f32>,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
}

impl ClosedMesh {
    pub const fn logical_dims(&self) -> MeshDims {
        self.logical
    }

    pub const fn closed_dims(&self) -> MeshDims {
        self.closed
    }

    pub const fn closure(&self) -> ClosurePolicy {
        self.closure
    }

    /// Closed azimuthal angle of each stored layer.
    pub fn azimuthal(&self) -> &[f32] {
        &self.azimuthal
    }

    /// Ghost layers before the first logical layer.
    pub const fn lo_offset(&self) -> usize {
        self.closure.ghost_layers()
    }

    /// Ghost layers after the seam layer.
    pub const fn hi_offset(&self) -> usize {
        self.closure.ghost_layers()
    }

    pub const fn seam_layers(&self) -> usize {
        self.closure.seam_layers()
    }
}

/// A transcribed field, ready for the database: scalar values or Cartesian
/// `(x, y, z)` components on the closed mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscribedField {
    Scalar(Vec<f32>),
    Vector([Vec<f32>; 3]),
}

impl TranscribedField {
    pub fn arity(&self) -> FieldArity {
        match self {
            Self::Scalar(_) => FieldArity::Scalar,
            Self::Vector(_) => FieldArity::Vector,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GridTranscriber {
    options: TranscribeOptions,
}

impl GridTranscriber {
    pub const fn new(options: TranscribeOptions) -> Self {
        Self { options }
    }

    pub fn build_mesh(&self, coordinates: &MeshCoordinates) -> Result<ClosedMesh, TranscribeError> {
        let logical = coordinates.dims();
        let closure = self.options.closure;
        let azimuthal = close_coordinates(&coordinates.azimuthal, closure)?;
        let closed = logical.with_azimuthal(azimuthal.len());
        debug!(%logical, %closed, "Closing mesh");

        let mut x = Vec::with_capacity(closed.cell_count());
        let mut y = Vec::with_capacity(closed.cell_count());
        let mut z = Vec::with_capacity(closed.cell_count());
        for phi in &azimuthal {
            let (sin, cos) = f64::from(*phi).sin_cos();
            for r in &coordinates.radial {
                let r = f64::from(*r);
                for q in &coordinates.axial {
                    x.push((r * cos) as f32);
                    y.push((r * sin) as f32);
                    z.push(*q);
                }
            }
        }

        Ok(ClosedMesh {
            logical,
            closed,
            closure,
            azimuthal,
            x,
            y,
            z,
        })
    }

    /// Closes, rotates and scrubs one field against `mesh`. Consumes the
    /// cycle's logical buffers.
    pub fn transcribe(
        &self,
        field: FieldData,
        mesh: &ClosedMesh,
    ) -> Result<TranscribedField, TranscribeError> {
        let logical = mesh.logical_dims();
        let closure = mesh.closure();
        let threshold = self.options.zero_threshold;
        match field {
            FieldData::Scalar(values) => {
                let mut closed = close_azimuth(&values, logical, closure)?;
                scrub_near_zero(&mut closed, threshold);
                Ok(TranscribedField::Scalar(closed))
            }
            FieldData::Vector(components) => {
                let [axial, radial, angular] = &components;
                let closed = [
                    close_azimuth(axial, logical, closure)?,
                    close_azimuth(radial, logical, closure)?,
                    close_azimuth(angular, logical, closure)?,
                ];
                let mut cartesian =
                    cylindrical_to_cartesian(&closed, mesh.closed_dims(), mesh.azimuthal())?;
                if self.options.axis_average {
                    let interior = closure.interior(logical.azimuthal);
                    let [x, y, _] = &mut cartesian;
                    average_axis(x, mesh.closed_dims(), interior.clone());
                    average_axis(y, mesh.closed_dims(), interior);
                }
                for component in &mut cartesian {
                    scrub_near_zero(component, threshold);
                }
                Ok(TranscribedField::Vector(cartesian))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ClosurePolicy, GridTranscriber, TranscribeError, TranscribeOptions, TranscribedField,
        scrub_near_zero,
    };
    use crate::domain::{FieldData, MeshDims};
    use crate::metadata::MeshCoordinates;
    use std::f32::consts::PI;

    fn mesh_coordinates(dims: MeshDims) -> MeshCoordinates {
        MeshCoordinates::uniform(dims, 4.0, 2.0, 2.0 * PI)
    }

    #[test]
    fn scrub_is_idempotent_and_keeps_large_values() {
        let mut values = vec![1.0e-8, -5.0e-8, 0.25, -3.0, 1.0e-7, f32::NAN];
        scrub_near_zero(&mut values, 1.0e-7);
        let once = values.clone();
        scrub_near_zero(&mut values, 1.0e-7);
        assert_eq!(&values[..5], &[0.0, 0.0, 0.25, -3.0, 1.0e-7]);
        assert_eq!(values[..5], once[..5]);
        assert!(values[5].is_nan());
    }

    #[test]
    fn closed_mesh_places_nodes_on_cylinders() {
        let dims = MeshDims::new(2, 3, 4);
        let transcriber = GridTranscriber::new(TranscribeOptions {
            closure: ClosurePolicy::Periodic { ghost_layers: 1 },
            ..TranscribeOptions::default()
        });
        let mesh = transcriber
            .build_mesh(&mesh_coordinates(dims))
            .expect("mesh should close");
        assert_eq!(mesh.closed_dims(), MeshDims::new(2, 3, 7));
        assert_eq!((mesh.lo_offset(), mesh.hi_offset()), (1, 1));
        assert_eq!(mesh.seam_layers(), 1);
        assert_eq!(mesh.x.len(), mesh.closed_dims().cell_count());

        let closed = mesh.closed_dims();
        for k in 0..closed.azimuthal {
            let n = closed.index(1, 2, k);
            let radius = (mesh.x[n].powi(2) + mesh.y[n].powi(2)).sqrt();
            assert!((radius - 2.0).abs() < 1.0e-5);
            assert_eq!(mesh.z[n], 4.0);
        }
        // Layer 0 is the wrapped copy of the last logical layer.
        let wrapped = closed.index(0, 2, 0);
        let last = closed.index(0, 2, 4);
        assert_eq!((mesh.x[wrapped], mesh.y[wrapped]), (mesh.x[last], mesh.y[last]));
    }

    #[test]
    fn half_domain_mesh_closes_at_pi() {
        let dims = MeshDims::new(1, 2, 3);
        let coordinates = MeshCoordinates::uniform(dims, 1.0, 1.0, PI);
        let transcriber = GridTranscriber::new(TranscribeOptions {
            closure: ClosurePolicy::HalfDomainMirror,
            ..TranscribeOptions::default()
        });
        let mesh = transcriber.build_mesh(&coordinates).expect("mesh should close");
        assert_eq!(mesh.closed_dims().azimuthal, 4);
        let seam = mesh.closed_dims().index(0, 1, 3);
        assert!((mesh.x[seam] + 1.0).abs() < 1.0e-6);
        assert!(mesh.y[seam].abs() < 1.0e-6);
    }

    #[test]
    fn scalar_fields_are_closed_and_scrubbed() {
        let dims = MeshDims::new(2, 2, 3);
        let transcriber = GridTranscriber::default();
        let mesh = transcriber
            .build_mesh(&mesh_coordinates(dims))
            .expect("mesh should close");
        let mut values: Vec<f32> = (0..dims.cell_count()).map(|n| n as f32).collect();
        values[5] = 3.0e-9;

        let field = transcriber
            .transcribe(FieldData::Scalar(values.clone()), &mesh)
            .expect("scalar should transcribe");
        let TranscribedField::Scalar(closed) = field else {
            panic!("scalar input should stay scalar");
        };
        assert_eq!(closed.len(), 4 * dims.layer_len());
        assert_eq!(closed[5], 0.0);
        assert_eq!(&closed[3 * dims.layer_len()..], &values[..dims.layer_len()]);
    }

    #[test]
    fn vector_fields_become_cartesian() {
        let dims = MeshDims::new(1, 2, 4);
        let transcriber = GridTranscriber::default();
        let mesh = transcriber
            .build_mesh(&mesh_coordinates(dims))
            .expect("mesh should close");
        let count = dims.cell_count();
        let field = FieldData::Vector([vec![5.0; count], vec![1.0; count], vec![0.0; count]]);

        let TranscribedField::Vector([x, y, z]) =
            transcriber.transcribe(field, &mesh).expect("vector should transcribe")
        else {
            panic!("vector input should stay vector");
        };
        // Unit radial vectors follow the node positions around the axis.
        for k in 0..mesh.closed_dims().azimuthal {
            let n = mesh.closed_dims().index(0, 1, k);
            assert!((x[n] - mesh.x[n] / 2.0).abs() < 1.0e-5);
            assert!((y[n] - mesh.y[n] / 2.0).abs() < 1.0e-5);
            assert_eq!(z[n], 5.0);
        }
    }

    #[test]
    fn axis_average_replaces_the_axis_ring() {
        let dims = MeshDims::new(1, 2, 4);
        let transcriber = GridTranscriber::new(TranscribeOptions {
            axis_average: true,
            ..TranscribeOptions::default()
        });
        let mesh = transcriber
            .build_mesh(&mesh_coordinates(dims))
            .expect("mesh should close");
        let count = dims.cell_count();
        let mut radial = vec![0.0_f32; count];
        let mut angular = vec![9.0_f32; count];
        for k in 0..dims.azimuthal {
            radial[dims.index(0, 1, k)] = 1.0;
            angular[dims.index(0, 1, k)] = 0.0;
        }
        let TranscribedField::Vector([x, y, _]) = transcriber
            .transcribe(FieldData::Vector([vec![0.0; count], radial, angular]), &mesh)
            .expect("vector should transcribe")
        else {
            panic!("vector input should stay vector");
        };
        // Unit radial vectors cancel around the ring.
        for k in 0..mesh.closed_dims().azimuthal {
            let axis = mesh.closed_dims().index(0, 0, k);
            assert_eq!((x[axis], y[axis]), (0.0, 0.0));
        }
    }

    #[test]
    fn mismatched_fields_abort() {
        let dims = MeshDims::new(2, 2, 2);
        let transcriber = GridTranscriber::default();
        let mesh = transcriber
            .build_mesh(&mesh_coordinates(dims))
            .expect("mesh should close");
        let error = transcriber
            .transcribe(FieldData::Scalar(vec![1.0; 3]), &mesh)
            .expect_err("short field must fail");
        assert_eq!(
            error,
            TranscribeError::DimensionMismatch {
                expected: 8,
                actual: 3
            }
        );
    }
}
