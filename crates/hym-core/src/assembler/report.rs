use super::CycleUnit;
use crate::domain::{Failure, HymError, HymResult};
use std::fs;
use std::path::Path;

const REPORT_HEADER: &str = "Cycle      Time    Out?     pnBvJ     Fault";

/// Renders one row per unit that needs reporting, or `None` when the run
/// was clean.
pub fn render_report(units: &[CycleUnit]) -> Option<String> {
    let rows = units
        .iter()
        .filter(|unit| unit.needs_report())
        .map(render_row)
        .collect::<Vec<_>>();
    if rows.is_empty() {
        return None;
    }

    let mut content = String::from(REPORT_HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(&row);
        content.push('\n');
    }
    Some(content)
}

fn render_row(unit: &CycleUnit) -> String {
    let time = if !unit.should_write() || unit.is_time_inconsistent() {
        format!("{:>10}", "NULL")
    } else {
        format!("{:>10.1}", unit.time())
    };
    let written = if unit.should_write() { "Yes" } else { "No" };
    format!(
        "  {:03}{}{:>8}     {}{:>10}",
        unit.cycle(),
        time,
        written,
        unit.mask_digits(),
        unit.status().as_str()
    )
}

/// Writes the report into `path` when any unit needs one.
pub fn write_report(units: &[CycleUnit], path: &Path) -> HymResult<bool> {
    let Some(content) = render_report(units) else {
        return Ok(false);
    };
    fs::write(path, content).map_err(|source| {
        HymError::new(
            Failure::ReportWrite,
            format!("failed to write report '{}': {}", path.display(), source),
        )
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::{render_report, write_report};
    use crate::assembler::CycleUnit;
    use crate::domain::{FieldData, FieldKind, FieldSelection, MeshDims};
    use crate::layout::RecordLayout;
    use crate::store::FieldStores;
    use std::fs;
    use tempfile::TempDir;

    fn units(times_p: &[f64], times_n: &[f64], cycles: usize) -> (TempDir, Vec<CycleUnit>) {
        let temp = TempDir::new().expect("tempdir should be created");
        let dims = MeshDims::new(1, 1, 1);
        for (kind, times) in [(FieldKind::Pressure, times_p), (FieldKind::Density, times_n)] {
            let layout = RecordLayout::new(dims, kind.arity());
            let field = FieldData::Scalar(vec![0.0]);
            let bytes = times
                .iter()
                .flat_map(|time| layout.encode_record(0, *time, &field).expect("record"))
                .collect::<Vec<_>>();
            fs::write(temp.path().join(kind.source_file()), bytes).expect("source written");
        }
        let selection = FieldSelection::parse("11000").expect("flags");
        let stores = FieldStores::open_selected(temp.path(), dims, &selection).expect("stores");
        let units = (1..=cycles)
            .map(|cycle| CycleUnit::build(cycle, &stores, &selection))
            .collect();
        (temp, units)
    }

    #[test]
    fn clean_run_produces_no_report() {
        let (temp, units) = units(&[1.0, 2.0], &[1.0, 2.0], 2);
        assert!(render_report(&units).is_none());
        let path = temp.path().join("report.n");
        assert!(!write_report(&units, &path).expect("no-op write"));
        assert!(!path.exists());
    }

    #[test]
    fn report_rows_use_fixed_columns() {
        let (temp, units) = units(&[1.0, 2.0, 3.0], &[1.0, 2.5], 4);
        let content = render_report(&units).expect("report expected");
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Cycle      Time    Out?     pnBvJ     Fault");
        assert_eq!(lines[1], "  002      NULL     Yes     11000      Time");
        assert_eq!(lines[2], "  003       3.0     Yes     10000      Data");
        assert_eq!(lines[3], "  004      NULL      No     00000      Data");
        assert_eq!(lines.len(), 4);

        let path = temp.path().join("report.n");
        assert!(write_report(&units, &path).expect("report written"));
        assert_eq!(fs::read_to_string(&path).expect("readable"), content);
    }
}
