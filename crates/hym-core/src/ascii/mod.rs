//! Plain-text dumps of one field at one cycle, on the logical mesh.

use crate::domain::{Failure, FieldData, FieldKind, HymError, HymResult};
use crate::metadata::MeshCoordinates;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const COLUMNS: usize = 6;
const VALUE_WIDTH: usize = 13;

pub fn ascii_file_name(kind: FieldKind, cycle: usize) -> String {
    format!("{}_{cycle:03}.dat", kind.ascii_prefix())
}

/// Formats like C's `%13.6E`: six mantissa decimals and a signed exponent
/// of at least two digits.
pub fn format_exponential(value: f64) -> String {
    if !value.is_finite() {
        let text = if value.is_nan() {
            "NAN"
        } else if value > 0.0 {
            "INF"
        } else {
            "-INF"
        };
        return format!("{text:>VALUE_WIDTH$}");
    }
    let rendered = format!("{value:.6E}");
    let text = match rendered.split_once('E') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or_default();
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}E{sign}{:02}", exponent.abs())
        }
        None => rendered,
    };
    format!("{text:>VALUE_WIDTH$}")
}

fn push_block(output: &mut String, values: impl IntoIterator<Item = f32>) {
    let mut column = 0;
    for value in values {
        output.push(' ');
        output.push_str(&format_exponential(f64::from(value)));
        column += 1;
        if column == COLUMNS {
            output.push('\n');
            column = 0;
        }
    }
    if column != 0 {
        output.push('\n');
    }
}

pub fn render_ascii(
    kind: FieldKind,
    time: f64,
    coordinates: &MeshCoordinates,
    field: &FieldData,
) -> String {
    let dims = coordinates.dims();
    let mut output = format!(
        "{}\n{}\nt={:7.1}\n{:3} {:3} {:3}\n",
        field.arity().as_str(),
        kind.letter(),
        time,
        dims.axial,
        dims.radial,
        dims.azimuthal
    );
    let nodes = coordinates
        .axial
        .iter()
        .chain(&coordinates.radial)
        .chain(&coordinates.azimuthal)
        .copied();
    push_block(&mut output, nodes);
    for component in field.components() {
        push_block(&mut output, component.iter().copied());
    }
    output
}

/// Writes `field` to `{ascii_prefix}_{cycle:03}.dat` under `dir`.
pub fn write_ascii(
    dir: &Path,
    kind: FieldKind,
    cycle: usize,
    time: f64,
    coordinates: &MeshCoordinates,
    field: &FieldData,
) -> HymResult<PathBuf> {
    if field.arity() != kind.arity() {
        return Err(HymError::new(
            Failure::Arity,
            format!(
                "{} field '{}' cannot be written as {}",
                kind.arity().as_str(),
                kind.variable_name(),
                field.arity().as_str()
            ),
        ));
    }
    let path = dir.join(ascii_file_name(kind, cycle));
    fs::write(&path, render_ascii(kind, time, coordinates, field)).map_err(|source| {
        HymError::new(
            Failure::AsciiWrite,
            format!("failed to write '{}': {}", path.display(), source),
        )
    })?;
    info!(file = %path.display(), "ASCII written");
    Ok(path)
}
