//! The conversion run: metadata, stores, per-cycle assembly, transcription
//! and the database writes, in that order.

mod options;

pub use options::{ConversionOptions, load_conversion_options};

use crate::ascii::write_ascii;
use crate::assembler::{CycleUnit, write_report};
use crate::common::constants::{MESH_FILE, MESH_NAME, STATUS_FILE};
use crate::database::{DatabaseSink, DatabaseWriter, MeshRecord, database_file_name};
use crate::domain::{CycleSelection, Failure, FieldSelection, HymError, HymResult};
use crate::metadata::{MeshCoordinates, read_mesh, read_status};
use crate::store::FieldStores;
use crate::transcribe::{GridTranscriber, TranscribedField};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub cycles: CycleSelection,
    pub fields: FieldSelection,
    pub options: ConversionOptions,
}

impl RunConfig {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        cycles: CycleSelection,
        fields: FieldSelection,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
            cycles,
            fields,
            options: ConversionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> HymResult<()> {
        for (role, dir) in [("data", &self.data_dir), ("output", &self.output_dir)] {
            if !dir.is_dir() {
                return Err(HymError::new(
                    Failure::PathMissing,
                    format!("{} directory '{}' does not exist", role, dir.display()),
                ));
            }
        }
        self.options.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycle_count: usize,
    pub written: Vec<usize>,
    pub ignored: Vec<usize>,
    pub report: Option<PathBuf>,
}

pub fn run_conversion<S: DatabaseSink>(config: &RunConfig, sink: &S) -> HymResult<RunSummary> {
    config.validate()?;
    let status = read_status(&config.data_dir.join(STATUS_FILE))?;
    let coordinates = read_mesh(&config.data_dir.join(MESH_FILE), status.dims)?;

    if config.fields.is_empty() {
        warn!("no fields were selected; no field data will be written");
    }
    let mut stores = FieldStores::open_selected(&config.data_dir, status.dims, &config.fields)?;
    let cycle_count = stores.unify_cycle_count(status.cycle_count);
    let cycles = config.cycles.cycles(cycle_count)?;

    let transcriber = GridTranscriber::new(config.options.transcribe_options());
    let mut summary = RunSummary {
        cycle_count,
        ..RunSummary::default()
    };
    let mut units = Vec::with_capacity(cycles.len());
    for cycle in cycles {
        let unit = CycleUnit::build(cycle, &stores, &config.fields);
        if unit.should_write() {
            let path = convert_cycle(config, sink, &transcriber, &coordinates, &mut stores, &unit)?;
            info!(file = %path.display(), "Output:");
            summary.written.push(cycle);
        } else {
            info!(cycle, "Ignored:");
            summary.ignored.push(cycle);
        }
        units.push(unit);
    }

    let report_path = config.output_dir.join(&config.options.report_name);
    if write_report(&units, &report_path)? {
        warn!(report = %report_path.display(), "anomalies were found; see the report");
        summary.report = Some(report_path);
    }
    Ok(summary)
}

fn convert_cycle<S: DatabaseSink>(
    config: &RunConfig,
    sink: &S,
    transcriber: &GridTranscriber,
    coordinates: &MeshCoordinates,
    stores: &mut FieldStores,
    unit: &CycleUnit,
) -> HymResult<PathBuf> {
    let cycle = unit.cycle();
    let mesh = transcriber.build_mesh(coordinates)?;
    let path = database_path(&config.output_dir, &config.options.database_prefix, cycle);
    let mut writer = sink.create(&path)?;
    writer.write_mesh(&MeshRecord::from_closed(MESH_NAME, &mesh, cycle, unit.time()))?;

    for kind in unit.present_fields() {
        let Some(store) = stores.get_mut(kind) else {
            continue;
        };
        let field = store.read_field(cycle)?;
        if config.options.write_ascii {
            write_ascii(
                &config.output_dir,
                kind,
                cycle,
                unit.time(),
                coordinates,
                &field,
            )?;
        }
        match transcriber.transcribe(field, &mesh)? {
            TranscribedField::Scalar(values) => {
                writer.write_scalar(kind.variable_name(), MESH_NAME, &values)?;
            }
            TranscribedField::Vector(components) => {
                let names = kind.component_names().ok_or_else(|| {
                    HymError::new(
                        Failure::Arity,
                        format!("scalar field '{}' produced vector data", kind.variable_name()),
                    )
                })?;
                writer.write_vector(kind.variable_name(), MESH_NAME, names, &components)?;
            }
        }
    }
    writer.close()?;
    Ok(path)
}

pub fn database_path(output_dir: &Path, prefix: &str, cycle: usize) -> PathBuf {
    output_dir.join(database_file_name(prefix, cycle))
}

#[cfg(test)]
mod tests {
    use super::{RunConfig, database_path};
    use crate::domain::{CycleSelection, FieldSelection};
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn missing_directories_fail_validation() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = RunConfig::new(
            temp.path().join("absent"),
            temp.path(),
            CycleSelection::All,
            FieldSelection::all(),
        );
        let error = config.validate().expect_err("absent data dir must fail");
        assert_eq!(error.placeholder(), "IO.PATH_MISSING");
        assert_eq!(error.exit_code(), 3);

        let config = RunConfig::new(
            temp.path(),
            temp.path(),
            CycleSelection::Single(2),
            FieldSelection::all(),
        );
        config.validate().expect("existing dirs should validate");
    }

    #[test]
    fn database_paths_use_prefix_and_cycle() {
        assert_eq!(
            database_path(Path::new("/out"), "HYM", 9),
            Path::new("/out/HYM_009.vdb")
        );
    }
}
