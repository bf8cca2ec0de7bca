use super::TranscribeError;
use crate::domain::MeshDims;
use std::ops::Range;

fn check_components(
    components: &[Vec<f32>; 3],
    dims: MeshDims,
    azimuthal: &[f32],
) -> Result<(), TranscribeError> {
    if azimuthal.len() != dims.azimuthal {
        return Err(TranscribeError::CoordinateMismatch {
            expected: dims.azimuthal,
            actual: azimuthal.len(),
        });
    }
    match components
        .iter()
        .find(|component| component.len() != dims.cell_count())
    {
        Some(component) => Err(TranscribeError::DimensionMismatch {
            expected: dims.cell_count(),
            actual: component.len(),
        }),
        None => Ok(()),
    }
}

/// Rotates `(axial, radial, azimuthal)` components into `(x, y, z)`.
///
/// `azimuthal` holds the node angle of every layer in `dims`.
pub fn cylindrical_to_cartesian(
    components: &[Vec<f32>; 3],
    dims: MeshDims,
    azimuthal: &[f32],
) -> Result<[Vec<f32>; 3], TranscribeError> {
    check_components(components, dims, azimuthal)?;
    let [axial, radial, angular] = components;
    let layer = dims.layer_len();

    let mut x = Vec::with_capacity(dims.cell_count());
    let mut y = Vec::with_capacity(dims.cell_count());
    for (k, phi) in azimuthal.iter().enumerate() {
        let (sin, cos) = f64::from(*phi).sin_cos();
        for n in k * layer..(k + 1) * layer {
            let r = f64::from(radial[n]);
            let s = f64::from(angular[n]);
            x.push((r * cos - s * sin) as f32);
            y.push((r * sin + s * cos) as f32);
        }
    }
    Ok([x, y, axial.clone()])
}

/// Inverse of [`cylindrical_to_cartesian`]. The `r = 0` ring has no
/// defined radial direction, so its radial and azimuthal parts are zero.
pub fn cartesian_to_cylindrical(
    components: &[Vec<f32>; 3],
    dims: MeshDims,
    azimuthal: &[f32],
) -> Result<[Vec<f32>; 3], TranscribeError> {
    check_components(components, dims, azimuthal)?;
    let [x, y, z] = components;
    let mut radial = vec![0.0_f32; dims.cell_count()];
    let mut angular = vec![0.0_f32; dims.cell_count()];
    for (k, phi) in azimuthal.iter().enumerate() {
        let (sin, cos) = f64::from(*phi).sin_cos();
        for j in 1..dims.radial {
            for i in 0..dims.axial {
                let n = dims.index(i, j, k);
                let (xv, yv) = (f64::from(x[n]), f64::from(y[n]));
                radial[n] = (xv * cos + yv * sin) as f32;
                angular[n] = (yv * cos - xv * sin) as f32;
            }
        }
    }
    Ok([z.clone(), radial, angular])
}

/// Replaces the `r = 0` ring of one Cartesian component with the mean of
/// the first off-axis ring over the `interior` layers.
pub fn average_axis(values: &mut [f32], dims: MeshDims, interior: Range<usize>) {
    if dims.radial < 2 || interior.is_empty() {
        return;
    }
    let count = interior.len() as f64;
    for i in 0..dims.axial {
        let mean = interior
            .clone()
            .map(|k| f64::from(values[dims.index(i, 1, k)]))
            .sum::<f64>()
            / count;
        for k in 0..dims.azimuthal {
            values[dims.index(i, 0, k)] = mean as f32;
        }
    }
}
