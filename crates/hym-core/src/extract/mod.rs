//! Reads fields back out of converted databases in the simulation's own
//! logical layout.

use crate::database::{DatabaseError, DatabaseReader, StoredMesh, StoredVariable, database_file_name};
use crate::domain::{Failure, FieldArity, HymError, HymResult, MeshDims};
use crate::transcribe::{cartesian_to_cylindrical, open_azimuth};
use std::path::Path;

/// Counts consecutive databases `{prefix}_001`, `{prefix}_002`, ... in
/// `dir`.
pub fn count_database_cycles(dir: &Path, prefix: &str) -> HymResult<usize> {
    let count = (1..)
        .take_while(|cycle| dir.join(database_file_name(prefix, *cycle)).is_file())
        .count();
    if count == 0 {
        return Err(HymError::new(
            Failure::NoDatabaseCycles,
            format!(
                "no '{}' databases found in '{}'",
                database_file_name(prefix, 1),
                dir.display()
            ),
        ));
    }
    Ok(count)
}

pub fn read_database_time(path: &Path) -> HymResult<f64> {
    let reader = DatabaseReader::open(path)?;
    Ok(reader.read_mesh()?.time)
}

/// Logical dimensions of the stored mesh, without closure layers.
pub fn read_database_dims(path: &Path) -> HymResult<MeshDims> {
    let reader = DatabaseReader::open(path)?;
    Ok(reader.read_mesh()?.logical_dims())
}

pub fn extract_scalar(path: &Path, name: &str) -> HymResult<Vec<f32>> {
    let reader = DatabaseReader::open(path)?;
    scalar_from_reader(&reader, name)
}

/// Returns `(axial, radial, azimuthal)` components.
pub fn extract_vector(path: &Path, name: &str) -> HymResult<[Vec<f32>; 3]> {
    let reader = DatabaseReader::open(path)?;
    vector_from_reader(&reader, name)
}

pub fn scalar_from_reader(reader: &DatabaseReader, name: &str) -> HymResult<Vec<f32>> {
    let mesh = reader.read_mesh()?;
    let variable = checked_variable(reader, name, FieldArity::Scalar)?;
    open_component(mesh, &variable.components[0])
}

pub fn vector_from_reader(reader: &DatabaseReader, name: &str) -> HymResult<[Vec<f32>; 3]> {
    let mesh = reader.read_mesh()?;
    let variable = checked_variable(reader, name, FieldArity::Vector)?;
    let [x, y, z] = [0, 1, 2].map(|c| open_component(mesh, &variable.components[c]));
    let cartesian = [x?, y?, z?];
    let azimuthal = recover_azimuth(mesh)?;
    Ok(cartesian_to_cylindrical(
        &cartesian,
        mesh.logical_dims(),
        &azimuthal,
    )?)
}

fn checked_variable<'a>(
    reader: &'a DatabaseReader,
    name: &str,
    expected: FieldArity,
) -> HymResult<&'a StoredVariable> {
    let variable = reader.read_variable(name)?;
    match variable.arity() {
        Some(arity) if arity == expected => Ok(variable),
        found => Err(DatabaseError::Rank {
            name: name.to_string(),
            expected: expected.as_str(),
            actual: found.map_or("malformed", FieldArity::as_str),
        }
        .into()),
    }
}

fn open_component(mesh: &StoredMesh, values: &[f32]) -> HymResult<Vec<f32>> {
    let logical = mesh.logical_dims();
    Ok(open_azimuth(
        values,
        logical.layer_len(),
        mesh.lo_offset,
        logical.azimuthal,
    )?)
}

/// Node angle of each logical layer, taken on the outer radial ring where
/// it is well defined.
fn recover_azimuth(mesh: &StoredMesh) -> HymResult<Vec<f32>> {
    let closed = mesh.closed_dims();
    let logical = mesh.logical_dims();
    let outer = closed.radial.checked_sub(1).ok_or_else(|| {
        HymError::new(
            Failure::DatabaseMesh,
            format!("mesh '{}' has no radial extent", mesh.name),
        )
    })?;
    (0..logical.azimuthal)
        .map(|k| {
            let n = closed.index(0, outer, mesh.lo_offset + k);
            match (mesh.x.get(n), mesh.y.get(n)) {
                (Some(x), Some(y)) => Ok(y.atan2(*x)),
                _ => Err(HymError::new(
                    Failure::DatabaseMesh,
                    format!("mesh '{}' node arrays are shorter than its dims", mesh.name),
                )),
            }
        })
        .collect()
}
