use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HymResult<T> = Result<T, HymError>;

/// Exit class of a failed run. A clean run exits with `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HymErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl HymErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    const fn code_prefix(self) -> &'static str {
        match self {
            Self::InputValidationError => "INPUT",
            Self::IoSystemError => "IO",
            Self::ComputationError => "RUN",
            Self::InternalError => "SYS",
        }
    }
}

/// Every condition that ends a conversion or extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    // Bad arguments, options or input contents.
    CliUsage,
    DataFlags,
    CycleSelection,
    StatusFormat,
    MeshFormat,
    MeshDims,
    NoValidCycles,
    OptionsFormat,
    OptionsValue,
    NoDatabaseCycles,
    DatabaseMesh,
    DatabaseVariable,
    // Files that cannot be found, read or written.
    PathMissing,
    StatusMissing,
    MeshMissing,
    SourceMissing,
    SourceRead,
    OptionsRead,
    ReportWrite,
    AsciiWrite,
    Database,
    Cli,
    // Out-of-range access during the run.
    CycleRange,
    // Broken internal invariants.
    Arity,
    LayoutBuffer,
    TranscribeDims,
    DatabaseShape,
}

impl Failure {
    pub const fn category(self) -> HymErrorCategory {
        match self {
            Self::CliUsage
            | Self::DataFlags
            | Self::CycleSelection
            | Self::StatusFormat
            | Self::MeshFormat
            | Self::MeshDims
            | Self::NoValidCycles
            | Self::OptionsFormat
            | Self::OptionsValue
            | Self::NoDatabaseCycles
            | Self::DatabaseMesh
            | Self::DatabaseVariable => HymErrorCategory::InputValidationError,
            Self::PathMissing
            | Self::StatusMissing
            | Self::MeshMissing
            | Self::SourceMissing
            | Self::SourceRead
            | Self::OptionsRead
            | Self::ReportWrite
            | Self::AsciiWrite
            | Self::Database
            | Self::Cli => HymErrorCategory::IoSystemError,
            Self::CycleRange => HymErrorCategory::ComputationError,
            Self::Arity | Self::LayoutBuffer | Self::TranscribeDims | Self::DatabaseShape => {
                HymErrorCategory::InternalError
            }
        }
    }

    const fn condition(self) -> &'static str {
        match self {
            Self::CliUsage => "CLI_USAGE",
            Self::DataFlags => "DATA_FLAGS",
            Self::CycleSelection => "CYCLE_SELECTION",
            Self::StatusFormat => "STATUS_FORMAT",
            Self::MeshFormat => "MESH_FORMAT",
            Self::MeshDims => "MESH_DIMS",
            Self::NoValidCycles => "NO_VALID_CYCLES",
            Self::OptionsFormat => "OPTIONS_FORMAT",
            Self::OptionsValue => "OPTIONS_VALUE",
            Self::NoDatabaseCycles => "NO_DATABASE_CYCLES",
            Self::DatabaseMesh => "DB_MESH",
            Self::DatabaseVariable => "DB_VARIABLE",
            Self::PathMissing => "PATH_MISSING",
            Self::StatusMissing => "STATUS_MISSING",
            Self::MeshMissing => "MESH_MISSING",
            Self::SourceMissing => "SOURCE_MISSING",
            Self::SourceRead => "SOURCE_READ",
            Self::OptionsRead => "OPTIONS_READ",
            Self::ReportWrite => "REPORT_WRITE",
            Self::AsciiWrite => "ASCII_WRITE",
            Self::Database => "DATABASE",
            Self::Cli => "CLI",
            Self::CycleRange => "CYCLE_RANGE",
            Self::Arity => "ARITY",
            Self::LayoutBuffer => "LAYOUT_BUFFER",
            Self::TranscribeDims => "TRANSCRIBE_DIMS",
            Self::DatabaseShape => "DB_SHAPE",
        }
    }
}

/// Code printed in diagnostics, e.g. `IO.SOURCE_MISSING`.
impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.category().code_prefix(), self.condition())
    }
}

/// Terminal failure of a run. The binary prints it once and exits with
/// [`HymError::exit_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HymError {
    failure: Failure,
    message: String,
}

impl HymError {
    pub fn new(failure: Failure, message: impl Into<String>) -> Self {
        Self {
            failure,
            message: message.into(),
        }
    }

    pub const fn failure(&self) -> Failure {
        self.failure
    }

    pub const fn category(&self) -> HymErrorCategory {
        self.failure.category()
    }

    pub fn placeholder(&self) -> String {
        self.failure.to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    /// The two stderr lines the binary prints before exiting.
    pub fn fatal_report(&self) -> String {
        format!(
            "ERROR: [{}] {}\nFATAL EXIT CODE: {}",
            self.failure,
            self.message,
            self.exit_code()
        )
    }
}

impl Display for HymError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.failure, self.message)
    }
}

impl Error for HymError {}

#[cfg(test)]
mod tests {
    use super::{Failure, HymError, HymErrorCategory};

    #[test]
    fn failure_codes_carry_their_exit_class() {
        let cases = [
            (Failure::SourceMissing, "IO.SOURCE_MISSING", 3),
            (Failure::NoValidCycles, "INPUT.NO_VALID_CYCLES", 2),
            (Failure::CycleRange, "RUN.CYCLE_RANGE", 4),
            (Failure::Arity, "SYS.ARITY", 5),
            (Failure::MeshDims, "INPUT.MESH_DIMS", 2),
            (Failure::DatabaseVariable, "INPUT.DB_VARIABLE", 2),
        ];

        for (failure, code, exit_code) in cases {
            assert_eq!(failure.to_string(), code);
            assert_eq!(failure.category().exit_code(), exit_code);
        }
    }

    #[test]
    fn fatal_report_names_code_and_exit() {
        let error = HymError::new(
            Failure::CycleRange,
            "cycle 12 is outside [1, 10] for 'h3ds.d'",
        );

        assert_eq!(error.category(), HymErrorCategory::ComputationError);
        assert_eq!(error.placeholder(), "RUN.CYCLE_RANGE");
        assert_eq!(
            error.fatal_report(),
            "ERROR: [RUN.CYCLE_RANGE] cycle 12 is outside [1, 10] for 'h3ds.d'\nFATAL EXIT CODE: 4"
        );
        assert_eq!(
            error.to_string(),
            "[RUN.CYCLE_RANGE] cycle 12 is outside [1, 10] for 'h3ds.d'"
        );
    }
}
