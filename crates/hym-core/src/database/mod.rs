//! Visualization database seam.
//!
//! The converter only talks to [`DatabaseSink`] and [`DatabaseWriter`];
//! [`JsonDatabase`] is the shipped implementation and [`DatabaseReader`]
//! reads its files back for extraction.

mod json;

pub use json::{DatabaseReader, JsonDatabase, JsonDatabaseWriter, StoredMesh, StoredVariable};

use crate::common::constants::DATABASE_EXTENSION;
use crate::domain::{Failure, HymError, MeshDims};
use crate::transcribe::ClosedMesh;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("failed to create database '{}': {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write database '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read database '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("database '{}' is malformed: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("database '{}' has no mesh", path.display())]
    MissingMesh { path: PathBuf },
    #[error("variable '{name}' is not in database '{}'", path.display())]
    MissingVariable { path: PathBuf, name: String },
    #[error("variable '{name}' is {actual} but {expected} was requested")]
    Rank {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("variable '{name}' has {actual} values per component but mesh '{mesh}' has {expected}")]
    Shape {
        name: String,
        mesh: String,
        expected: usize,
        actual: usize,
    },
}

impl From<DatabaseError> for HymError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::MissingVariable { .. } | DatabaseError::Rank { .. } => {
                HymError::new(Failure::DatabaseVariable, error.to_string())
            }
            DatabaseError::Shape { .. } => HymError::new(Failure::DatabaseShape, error.to_string()),
            _ => HymError::new(Failure::Database, error.to_string()),
        }
    }
}

/// `{prefix}_{cycle:03}.vdb`
pub fn database_file_name(prefix: &str, cycle: usize) -> String {
    format!("{prefix}_{cycle:03}.{DATABASE_EXTENSION}")
}

/// Structured mesh as handed to a writer, with its cycle stamp and the
/// azimuthal closure layout. `lo_offset` and `hi_offset` count ghost layers
/// only; the seam layer between the logical layers and `hi_offset` is part
/// of the mesh.
#[derive(Debug, Clone, Copy)]
pub struct MeshRecord<'a> {
    pub name: &'a str,
    pub dims: MeshDims,
    pub x: &'a [f32],
    pub y: &'a [f32],
    pub z: &'a [f32],
    pub cycle: usize,
    pub time: f64,
    pub lo_offset: usize,
    pub hi_offset: usize,
    pub seam_layers: usize,
}

impl<'a> MeshRecord<'a> {
    pub fn from_closed(name: &'a str, mesh: &'a ClosedMesh, cycle: usize, time: f64) -> Self {
        Self {
            name,
            dims: mesh.closed_dims(),
            x: &mesh.x,
            y: &mesh.y,
            z: &mesh.z,
            cycle,
            time,
            lo_offset: mesh.lo_offset(),
            hi_offset: mesh.hi_offset(),
            seam_layers: mesh.seam_layers(),
        }
    }
}

pub trait DatabaseSink {
    type Writer: DatabaseWriter;

    fn create(&self, path: &Path) -> Result<Self::Writer, DatabaseError>;
}

/// One open database file. Variables must be written after their mesh.
pub trait DatabaseWriter {
    fn write_mesh(&mut self, mesh: &MeshRecord<'_>) -> Result<(), DatabaseError>;

    fn write_scalar(
        &mut self,
        name: &str,
        mesh_name: &str,
        values: &[f32],
    ) -> Result<(), DatabaseError>;

    fn write_vector(
        &mut self,
        name: &str,
        mesh_name: &str,
        component_names: [&str; 3],
        components: &[Vec<f32>; 3],
    ) -> Result<(), DatabaseError>;

    fn close(self) -> Result<(), DatabaseError>;
}
