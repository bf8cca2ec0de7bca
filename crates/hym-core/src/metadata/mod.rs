//! Run-level metadata read once at startup: the status file (logical
//! dimensions and nominal cycle count) and the mesh coordinate file.

use crate::common::constants::{INT_BYTES, SAMPLE_BYTES, STATUS_RADIAL_OFFSET};
use crate::domain::{Failure, HymError, HymResult, MeshDims};
use crate::layout::GhostPadding;
use std::fs;
use std::path::Path;
use tracing::info;

const STATUS_LEADING_TOKENS: usize = 4;
const STATUS_MIDDLE_TOKENS: usize = 17;
const MESH_LEADING_INTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub dims: MeshDims,
    pub cycle_count: usize,
}

/// Logical node coordinates along each axis of the cylindrical mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshCoordinates {
    pub axial: Vec<f32>,
    pub radial: Vec<f32>,
    pub azimuthal: Vec<f32>,
}

impl MeshCoordinates {
    pub fn dims(&self) -> MeshDims {
        MeshDims::new(self.axial.len(), self.radial.len(), self.azimuthal.len())
    }

    /// Evenly spaced mesh with `azimuthal_span` split into `dims.azimuthal`
    /// cells starting at zero.
    pub fn uniform(dims: MeshDims, axial_length: f32, outer_radius: f32, azimuthal_span: f32) -> Self {
        let spaced = |count: usize, span: f32, closed: bool| {
            let divisions = if closed {
                count.saturating_sub(1).max(1)
            } else {
                count.max(1)
            };
            (0..count)
                .map(|n| span * n as f32 / divisions as f32)
                .collect::<Vec<_>>()
        };
        Self {
            axial: spaced(dims.axial, axial_length, true),
            radial: spaced(dims.radial, outer_radius, true),
            azimuthal: spaced(dims.azimuthal, azimuthal_span, false),
        }
    }
}

pub fn read_status(path: &Path) -> HymResult<RunStatus> {
    let source = fs::read_to_string(path).map_err(|source| {
        HymError::new(
            Failure::StatusMissing,
            format!("status file '{}' could not be read: {}", path.display(), source),
        )
    })?;
    let status = parse_status_source(&source)?;
    info!(file = %path.display(), cycles = status.cycle_count, "Reading status");
    Ok(status)
}

pub fn parse_status_source(source: &str) -> HymResult<RunStatus> {
    let mut tokens = source.split_whitespace();

    skip_tokens(&mut tokens, STATUS_LEADING_TOKENS)?;
    let mut extents = [0_usize; 3];
    for extent in &mut extents {
        let _label = tokens.next().ok_or_else(truncated_status)?;
        *extent = parse_status_count(tokens.next())?;
    }
    skip_tokens(&mut tokens, STATUS_MIDDLE_TOKENS)?;
    let cycle_count = parse_status_count(tokens.next())?;

    Ok(RunStatus {
        dims: MeshDims::new(extents[0], extents[1] + STATUS_RADIAL_OFFSET, extents[2]),
        cycle_count,
    })
}

/// Renders a status file that [`parse_status_source`] reads back to the
/// given values.
pub fn render_status_source(dims: MeshDims, cycle_count: usize) -> String {
    let filler = (1..=STATUS_MIDDLE_TOKENS)
        .map(|n| format!("s{:02}", n))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "HYM run status file\nnz {}\nnr {}\nnphi {}\n{}\n{}\n",
        dims.axial,
        dims.radial.saturating_sub(STATUS_RADIAL_OFFSET),
        dims.azimuthal,
        filler,
        cycle_count
    )
}

fn skip_tokens<'a>(tokens: &mut impl Iterator<Item = &'a str>, count: usize) -> HymResult<()> {
    for _ in 0..count {
        tokens.next().ok_or_else(truncated_status)?;
    }
    Ok(())
}

fn truncated_status() -> HymError {
    HymError::new(Failure::StatusFormat, "status file ended early")
}

fn parse_status_count(token: Option<&str>) -> HymResult<usize> {
    let token = token.ok_or_else(truncated_status)?;
    token.parse::<usize>().map_err(|_| {
        HymError::new(
            Failure::StatusFormat,
            format!("status file value '{}' is not a non-negative integer", token),
        )
    })
}

/// Reads the mesh file and strips its ghost coordinates; the stripped
/// extents must equal `expected`.
pub fn read_mesh(path: &Path, expected: MeshDims) -> HymResult<MeshCoordinates> {
    let bytes = fs::read(path).map_err(|source| {
        HymError::new(
            Failure::MeshMissing,
            format!("mesh file '{}' could not be read: {}", path.display(), source),
        )
    })?;
    let coordinates = decode_mesh_bytes(&bytes, GhostPadding::SOURCE).ok_or_else(|| {
        HymError::new(
            Failure::MeshFormat,
            format!("mesh file '{}' is truncated or malformed", path.display()),
        )
    })?;

    let found = coordinates.dims();
    if found != expected {
        return Err(HymError::new(
            Failure::MeshDims,
            format!(
                "mesh file '{}' has dimensions {} but the run expects {}",
                path.display(),
                found,
                expected
            ),
        ));
    }
    Ok(coordinates)
}

fn decode_mesh_bytes(bytes: &[u8], ghosts: GhostPadding) -> Option<MeshCoordinates> {
    let mut offset = MESH_LEADING_INTS * INT_BYTES;
    let nq = usize::try_from(take_i32(bytes, &mut offset)?).ok()?;
    let nr = usize::try_from(take_i32(bytes, &mut offset)?).ok()?;
    let ns = usize::try_from(take_i32(bytes, &mut offset)?).ok()?;
    offset += SAMPLE_BYTES;

    let axial = take_f64_array(bytes, &mut offset, nq)?;
    let radial = take_f64_array(bytes, &mut offset, nr)?;
    let azimuthal = take_f64_array(bytes, &mut offset, ns)?;
    if nq < ghosts.axial.0 + ghosts.axial.1
        || nr < ghosts.radial.0 + ghosts.radial.1
        || ns < ghosts.azimuthal.0 + ghosts.azimuthal.1
    {
        return None;
    }

    Some(MeshCoordinates {
        axial: GhostPadding::strip_axis(&axial, ghosts.axial),
        radial: GhostPadding::strip_axis(&radial, ghosts.radial),
        azimuthal: GhostPadding::strip_axis(&azimuthal, ghosts.azimuthal),
    })
}

/// Encodes a mesh file whose ghost coordinates repeat the edge values.
pub fn encode_mesh_file(coordinates: &MeshCoordinates) -> Vec<u8> {
    let ghosts = GhostPadding::SOURCE;
    let pad = |values: &[f32], (lo, hi): (usize, usize)| {
        let first = values.first().copied().unwrap_or_default();
        let last = values.last().copied().unwrap_or_default();
        std::iter::repeat_n(first, lo)
            .chain(values.iter().copied())
            .chain(std::iter::repeat_n(last, hi))
            .map(f64::from)
            .collect::<Vec<_>>()
    };
    let axial = pad(&coordinates.axial, ghosts.axial);
    let radial = pad(&coordinates.radial, ghosts.radial);
    let azimuthal = pad(&coordinates.azimuthal, ghosts.azimuthal);

    let mut bytes = vec![0_u8; MESH_LEADING_INTS * INT_BYTES];
    for count in [axial.len(), radial.len(), azimuthal.len()] {
        bytes.extend_from_slice(&(count as i32).to_le_bytes());
    }
    bytes.extend_from_slice(&0.0_f64.to_le_bytes());
    for value in axial.iter().chain(&radial).chain(&azimuthal) {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn take_i32(bytes: &[u8], offset: &mut usize) -> Option<i32> {
    let end = offset.checked_add(std::mem::size_of::<i32>())?;
    let slice = bytes.get(*offset..end)?;
    let value = i32::from_le_bytes(slice.try_into().ok()?);
    *offset = end;
    Some(value)
}

fn take_f64_array(bytes: &[u8], offset: &mut usize, count: usize) -> Option<Vec<f64>> {
    let end = offset.checked_add(count.checked_mul(SAMPLE_BYTES)?)?;
    let slice = bytes.get(*offset..end)?;
    *offset = end;
    Some(
        slice
            .chunks_exact(SAMPLE_BYTES)
            .filter_map(|chunk| chunk.try_into().ok().map(f64::from_le_bytes))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::{
        MeshCoordinates, encode_mesh_file, parse_status_source, read_mesh, render_status_source,
    };
    use crate::domain::{HymErrorCategory, MeshDims};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn status_source_adds_near_axis_points_back() {
        let source = "HYM run status file\nnz 16\nnr 6\nnphi 12\n\
                      a b c d e f g h i j k l m n o p q\n42\n";
        let status = parse_status_source(source).expect("status should parse");
        assert_eq!(status.dims, MeshDims::new(16, 8, 12));
        assert_eq!(status.cycle_count, 42);
    }

    #[test]
    fn rendered_status_round_trips() {
        let dims = MeshDims::new(5, 4, 6);
        let status = parse_status_source(&render_status_source(dims, 9))
            .expect("rendered status should parse");
        assert_eq!(status.dims, dims);
        assert_eq!(status.cycle_count, 9);
    }

    #[test]
    fn truncated_status_is_an_input_error() {
        let error = parse_status_source("HYM run status file\nnz 16\n")
            .expect_err("truncated status must fail");
        assert_eq!(error.category(), HymErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.STATUS_FORMAT");

        let error = parse_status_source("a b c d nz x nr 1 nphi 1")
            .expect_err("non-numeric extent must fail");
        assert!(error.message().contains("'x'"));
    }

    #[test]
    fn mesh_file_strips_ghost_coordinates() {
        let temp = TempDir::new().expect("tempdir should be created");
        let dims = MeshDims::new(4, 3, 6);
        let coordinates = MeshCoordinates::uniform(dims, 3.0, 2.0, std::f32::consts::TAU);
        let path = temp.path().join("hgrid.d");
        fs::write(&path, encode_mesh_file(&coordinates)).expect("mesh should be written");

        let read = read_mesh(&path, dims).expect("mesh should read back");
        assert_eq!(read, coordinates);
        assert_eq!(read.radial, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn mesh_dimension_mismatch_is_fatal() {
        let temp = TempDir::new().expect("tempdir should be created");
        let coordinates =
            MeshCoordinates::uniform(MeshDims::new(4, 3, 6), 1.0, 1.0, std::f32::consts::TAU);
        let path = temp.path().join("hgrid.d");
        fs::write(&path, encode_mesh_file(&coordinates)).expect("mesh should be written");

        let error = read_mesh(&path, MeshDims::new(4, 3, 7)).expect_err("dims differ");
        assert_eq!(error.placeholder(), "INPUT.MESH_DIMS");

        fs::write(&path, [0_u8; 10]).expect("truncated mesh should be written");
        let error = read_mesh(&path, MeshDims::new(4, 3, 6)).expect_err("truncated mesh");
        assert_eq!(error.placeholder(), "INPUT.MESH_FORMAT");
    }
}
