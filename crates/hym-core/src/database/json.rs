use super::{DatabaseError, DatabaseSink, DatabaseWriter, MeshRecord};
use crate::domain::{FieldArity, MeshDims};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const FORMAT_TAG: &str = "hym-vdb/1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMesh {
    pub name: String,
    pub dims: [usize; 3],
    pub cycle: usize,
    pub time: f64,
    pub lo_offset: usize,
    pub hi_offset: usize,
    pub seam_layers: usize,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
}

impl StoredMesh {
    pub fn closed_dims(&self) -> MeshDims {
        let [axial, radial, azimuthal] = self.dims;
        MeshDims::new(axial, radial, azimuthal)
    }

    /// Dimensions with the ghost and seam layers removed.
    pub fn logical_dims(&self) -> MeshDims {
        let closed = self.closed_dims();
        closed.with_azimuthal(
            closed
                .azimuthal
                .saturating_sub(self.lo_offset + self.seam_layers + self.hi_offset),
        )
    }
}

/// Node-centred variable; one entry in `components` per component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVariable {
    pub mesh: String,
    pub dims: [usize; 3],
    pub centering: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component_names: Vec<String>,
    pub components: Vec<Vec<f32>>,
}

impl StoredVariable {
    pub fn arity(&self) -> Option<FieldArity> {
        FieldArity::from_values_per_cell(self.components.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseDocument {
    format: String,
    mesh: Option<StoredMesh>,
    variables: BTreeMap<String, StoredVariable>,
}

/// Writes one JSON document per database file.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDatabase;

impl DatabaseSink for JsonDatabase {
    type Writer = JsonDatabaseWriter;

    fn create(&self, path: &Path) -> Result<Self::Writer, DatabaseError> {
        let file = File::create(path).map_err(|source| DatabaseError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(JsonDatabaseWriter {
            path: path.to_path_buf(),
            output: BufWriter::new(file),
            document: DatabaseDocument {
                format: FORMAT_TAG.to_string(),
                ..DatabaseDocument::default()
            },
        })
    }
}

#[derive(Debug)]
pub struct JsonDatabaseWriter {
    path: PathBuf,
    output: BufWriter<File>,
    document: DatabaseDocument,
}

impl JsonDatabaseWriter {
    fn insert_variable(
        &mut self,
        name: &str,
        mesh_name: &str,
        component_names: Vec<String>,
        components: Vec<Vec<f32>>,
    ) -> Result<(), DatabaseError> {
        let mesh = match &self.document.mesh {
            Some(mesh) if mesh.name == mesh_name => mesh,
            _ => {
                return Err(DatabaseError::MissingMesh {
                    path: self.path.clone(),
                });
            }
        };
        let expected = mesh.closed_dims().cell_count();
        if let Some(component) = components.iter().find(|c| c.len() != expected) {
            return Err(DatabaseError::Shape {
                name: name.to_string(),
                mesh: mesh_name.to_string(),
                expected,
                actual: component.len(),
            });
        }
        let variable = StoredVariable {
            mesh: mesh_name.to_string(),
            dims: mesh.dims,
            centering: "node".to_string(),
            component_names,
            components,
        };
        self.document.variables.insert(name.to_string(), variable);
        Ok(())
    }
}

impl DatabaseWriter for JsonDatabaseWriter {
    fn write_mesh(&mut self, mesh: &MeshRecord<'_>) -> Result<(), DatabaseError> {
        self.document.mesh = Some(StoredMesh {
            name: mesh.name.to_string(),
            dims: mesh.dims.as_array(),
            cycle: mesh.cycle,
            time: mesh.time,
            lo_offset: mesh.lo_offset,
            hi_offset: mesh.hi_offset,
            seam_layers: mesh.seam_layers,
            x: mesh.x.to_vec(),
            y: mesh.y.to_vec(),
            z: mesh.z.to_vec(),
        });
        Ok(())
    }

    fn write_scalar(
        &mut self,
        name: &str,
        mesh_name: &str,
        values: &[f32],
    ) -> Result<(), DatabaseError> {
        self.insert_variable(name, mesh_name, Vec::new(), vec![values.to_vec()])
    }

    fn write_vector(
        &mut self,
        name: &str,
        mesh_name: &str,
        component_names: [&str; 3],
        components: &[Vec<f32>; 3],
    ) -> Result<(), DatabaseError> {
        self.insert_variable(
            name,
            mesh_name,
            component_names.iter().map(|c| c.to_string()).collect(),
            components.to_vec(),
        )
    }

    fn close(mut self) -> Result<(), DatabaseError> {
        serde_json::to_writer(&mut self.output, &self.document).map_err(|source| {
            DatabaseError::Write {
                path: self.path.clone(),
                source: source.into(),
            }
        })?;
        self.output.flush().map_err(|source| DatabaseError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Read access to a database file written by [`JsonDatabase`].
#[derive(Debug, Clone)]
pub struct DatabaseReader {
    path: PathBuf,
    document: DatabaseDocument,
}

impl DatabaseReader {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let path = path.into();
        let source = fs::read_to_string(&path).map_err(|source| DatabaseError::Read {
            path: path.clone(),
            source,
        })?;
        let document = serde_json::from_str(&source).map_err(|source| DatabaseError::Parse {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_mesh(&self) -> Result<&StoredMesh, DatabaseError> {
        self.document
            .mesh
            .as_ref()
            .ok_or_else(|| DatabaseError::MissingMesh {
                path: self.path.clone(),
            })
    }

    pub fn read_variable(&self, name: &str) -> Result<&StoredVariable, DatabaseError> {
        self.document
            .variables
            .get(name)
            .ok_or_else(|| DatabaseError::MissingVariable {
                path: self.path.clone(),
                name: name.to_string(),
            })
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.document.variables.keys().map(String::as_str)
    }
}
