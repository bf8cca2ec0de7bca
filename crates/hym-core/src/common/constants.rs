//! Fixed constants of the simulation's binary output and of the database
//! conventions.
//!
//! Record geometry is derived from these values in exactly one place,
//! [`crate::layout::RecordLayout`]; nothing else should do byte arithmetic
//! with them.

pub const PI: f64 = std::f64::consts::PI;

pub const INT_BYTES: usize = 4;
pub const SAMPLE_BYTES: usize = 8;

/// Record marker and step integers that open every record.
pub const RECORD_LEAD_INTS: usize = 2;
/// Ghost-padded dimension triple that follows the time value.
pub const RECORD_DIM_INTS: usize = 3;
pub const RECORD_TRAILER_BYTES: usize = 20;

/// Ghost cells the source carries below and above each logical axis.
///
/// The `r = 0` and `r = dr` points are real mesh points, so the radial axis
/// has no low-side padding.
pub const GHOST_AXIAL: (usize, usize) = (2, 2);
pub const GHOST_RADIAL: (usize, usize) = (0, 2);
pub const GHOST_AZIMUTHAL: (usize, usize) = (2, 2);

/// The status file counts radial points from `r = 2 dr`.
pub const STATUS_RADIAL_OFFSET: usize = 2;

pub const ZERO_THRESHOLD: f32 = 1.0e-7;

/// Canonical time of a cycle whose fields disagree on the time value.
pub const TIME_SENTINEL: f64 = -1.0;

pub const MESH_NAME: &str = "HYM_mesh";
pub const DATABASE_PREFIX: &str = "HYM";
pub const DATABASE_EXTENSION: &str = "vdb";
pub const REPORT_NAME: &str = "SILO_Report.n";

pub const MESH_FILE: &str = "hgrid.d";
pub const STATUS_FILE: &str = "hstat.d";
