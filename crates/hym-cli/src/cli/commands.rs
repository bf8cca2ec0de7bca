use super::CliError;
use anyhow::Context;
use hym_core::conversion::{ConversionOptions, RunConfig, load_conversion_options, run_conversion};
use hym_core::database::{DatabaseReader, JsonDatabase};
use hym_core::domain::{CycleSelection, FieldSelection, HymError};
use hym_core::extract::{scalar_from_reader, vector_from_reader};
use hym_core::transcribe::ClosurePolicy;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

const COMPONENT_LABELS: [&str; 3] = ["axial", "radial", "azimuthal"];

#[derive(clap::Args)]
pub(super) struct ConvertArgs {
    /// Directory holding hstat.d, hgrid.d and the h3d*.d field files
    #[arg(value_name = "DATA_DIR")]
    data_dir: PathBuf,

    /// Directory receiving the databases and the anomaly report
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Cycle to convert; 0 converts every cycle
    #[arg(value_name = "CYCLE")]
    cycle: usize,

    /// Five 0/1 flags selecting p, n, B, v and J
    #[arg(value_name = "FLAGS")]
    flags: String,

    /// JSON conversion options file
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Close the azimuth as a half domain mirrored at pi
    #[arg(long, conflicts_with = "ghost_layers")]
    half_domain: bool,

    /// Periodic ghost layers added on each side of the azimuthal seam
    #[arg(long, value_name = "N")]
    ghost_layers: Option<usize>,

    /// Replace the axis ring of vector fields with the first-ring average
    #[arg(long)]
    axis_average: bool,

    /// Also write ASCII dumps of every converted field
    #[arg(long)]
    ascii: bool,
}

impl ConvertArgs {
    fn into_config(self) -> Result<RunConfig, CliError> {
        let fields = FieldSelection::parse(&self.flags)?;
        let mut options = match &self.options {
            Some(path) => load_conversion_options(path)?,
            None => ConversionOptions::default(),
        };
        if self.half_domain {
            options.closure = ClosurePolicy::HalfDomainMirror;
        }
        if let Some(ghost_layers) = self.ghost_layers {
            options.closure = ClosurePolicy::Periodic { ghost_layers };
        }
        options.axis_average |= self.axis_average;
        options.write_ascii |= self.ascii;

        Ok(RunConfig::new(
            self.data_dir,
            self.output_dir,
            CycleSelection::from_requested(self.cycle),
            fields,
        )
        .with_options(options))
    }
}

#[derive(clap::Args)]
pub(super) struct ExtractArgs {
    /// Database file written by `convert`
    #[arg(value_name = "DB_FILE")]
    database: PathBuf,

    /// Variable name, e.g. pressure or b_field
    #[arg(value_name = "VARIABLE")]
    variable: String,

    /// Read the variable as a vector and report cylindrical components
    #[arg(long)]
    vector: bool,
}

pub(super) fn run_convert_command(args: ConvertArgs) -> Result<i32, CliError> {
    let config = args.into_config()?;
    info!(
        data_dir = %config.data_dir.display(),
        output_dir = %config.output_dir.display(),
        fields = %config.fields,
        "Starting conversion"
    );
    let summary = run_conversion(&config, &JsonDatabase)?;

    let mut stdout = std::io::stdout().lock();
    writeln!(
        stdout,
        "Converted {} cycle(s), ignored {} of {} total",
        summary.written.len(),
        summary.ignored.len(),
        summary.cycle_count
    )
    .context("failed to write conversion summary")?;
    if let Some(report) = &summary.report {
        writeln!(stdout, "Anomaly report: {}", report.display())
            .context("failed to write conversion summary")?;
    }
    Ok(0)
}

pub(super) fn run_extract_command(args: ExtractArgs) -> Result<i32, CliError> {
    let reader = DatabaseReader::open(&args.database).map_err(HymError::from)?;
    let mesh = reader.read_mesh().map_err(HymError::from)?;
    let time = mesh.time;
    let dims = mesh.logical_dims();

    let components = if args.vector {
        let [axial, radial, azimuthal] = vector_from_reader(&reader, &args.variable)?;
        COMPONENT_LABELS
            .iter()
            .map(|label| format!("{}[{}]", args.variable, label))
            .zip([axial, radial, azimuthal])
            .collect::<Vec<_>>()
    } else {
        vec![(
            args.variable.clone(),
            scalar_from_reader(&reader, &args.variable)?,
        )]
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "database: {}", args.database.display())
        .and_then(|_| writeln!(stdout, "time: {}", time))
        .and_then(|_| writeln!(stdout, "dims: {}", dims))
        .context("failed to write extraction summary")?;
    for (label, values) in &components {
        let (min, max) = value_range(values);
        writeln!(stdout, "{label}: min={min:.6e} max={max:.6e}")
            .context("failed to write extraction summary")?;
    }
    Ok(0)
}

fn value_range(values: &[f32]) -> (f32, f32) {
    values
        .iter()
        .copied()
        .filter(|value| !value.is_nan())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), value| {
            (min.min(value), max.max(value))
        })
}
