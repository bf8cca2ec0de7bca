//! Per-field access to the simulation's append-only binary output.

mod parser;

use crate::domain::{
    FIELD_COUNT, Failure, FieldArity, FieldData, FieldKind, FieldSelection, HymError, HymResult,
    MeshDims,
};
use crate::layout::RecordLayout;
use parser::{read_f64_at, read_f64_block, read_i32_triple};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One field's source file, validated up front.
///
/// `presence[c - 1]` is true when cycle `c` lies fully inside the file and
/// its embedded dimensions match the logical mesh. Only those cycles carry
/// a time value.
#[derive(Debug)]
pub struct TimeSeriesStore {
    kind: FieldKind,
    path: PathBuf,
    reader: BufReader<File>,
    layout: RecordLayout,
    presence: Vec<bool>,
    times: Vec<Option<f64>>,
}

impl TimeSeriesStore {
    pub fn open(kind: FieldKind, path: impl Into<PathBuf>, dims: MeshDims) -> HymResult<Self> {
        let path = path.into();
        let file = File::open(&path).map_err(|source| {
            HymError::new(
                Failure::SourceMissing,
                format!(
                    "the data for the variable {} was not found at '{}': {}",
                    kind.letter(),
                    path.display(),
                    source
                ),
            )
        })?;
        let file_len = file
            .metadata()
            .map_err(|source| {
                HymError::new(
                    Failure::SourceRead,
                    format!("failed to stat '{}': {}", path.display(), source),
                )
            })?
            .len();

        let layout = RecordLayout::new(dims, kind.arity());
        debug!(
            file = %path.display(),
            record_bytes = layout.byte_size(),
            padded = %layout.padded_dims(),
            "computed record layout"
        );

        let mut store = Self {
            kind,
            path,
            reader: BufReader::new(file),
            layout,
            presence: Vec::new(),
            times: Vec::new(),
        };
        store.validate(file_len)?;
        store.load_times()?;

        info!(
            file = %store.file_name(),
            cycles = store.cycle_count(),
            "Reading"
        );
        Ok(store)
    }

    /// Opens `kind`'s conventional source file inside `data_dir`.
    pub fn open_in(kind: FieldKind, data_dir: &Path, dims: MeshDims) -> HymResult<Self> {
        Self::open(kind, data_dir.join(kind.source_file()), dims)
    }

    fn validate(&mut self, file_len: u64) -> HymResult<()> {
        let cycle_count = self.layout.complete_cycles(file_len);
        let ghosts = self.layout.ghosts();
        let logical = self.layout.logical_dims();

        let mut presence = Vec::with_capacity(cycle_count);
        for cycle in 1..=cycle_count {
            let header = read_i32_triple(
                &mut self.reader,
                self.layout.dims_offset(cycle),
                &self.path,
            )?;
            let matches = ghosts.strip(header) == Some(logical);
            if !matches {
                debug!(
                    file = %self.file_name(),
                    cycle,
                    header = ?header,
                    "record dimensions do not match the mesh"
                );
            }
            presence.push(matches);
        }

        if !presence.iter().any(|present| *present) {
            return Err(HymError::new(
                Failure::NoValidCycles,
                format!(
                    "error validating the binary file '{}': no valid data is stored in the file",
                    self.path.display()
                ),
            ));
        }

        self.presence = presence;
        Ok(())
    }

    fn load_times(&mut self) -> HymResult<()> {
        let mut times = Vec::with_capacity(self.presence.len());
        for (index, present) in self.presence.iter().enumerate() {
            let time = if *present {
                Some(read_f64_at(
                    &mut self.reader,
                    self.layout.time_offset(index + 1),
                    &self.path,
                )?)
            } else {
                None
            };
            times.push(time);
        }
        self.times = times;
        Ok(())
    }

    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn cycle_count(&self) -> usize {
        self.presence.len()
    }

    pub fn presence(&self) -> &[bool] {
        &self.presence
    }

    /// Presence of 1-based `cycle`; cycles beyond the file are absent.
    pub fn is_present(&self, cycle: usize) -> bool {
        cycle
            .checked_sub(1)
            .and_then(|index| self.presence.get(index))
            .copied()
            .unwrap_or(false)
    }

    pub fn time(&self, cycle: usize) -> Option<f64> {
        cycle
            .checked_sub(1)
            .and_then(|index| self.times.get(index))
            .copied()
            .flatten()
    }

    /// Reads and ghost-strips the field stored for `cycle`.
    ///
    /// Does not look at the presence mask; asking for a cycle outside
    /// `[1, cycle_count]` is fatal.
    pub fn read_field(&mut self, cycle: usize) -> HymResult<FieldData> {
        if cycle < 1 || cycle > self.cycle_count() {
            return Err(HymError::new(
                Failure::CycleRange,
                format!(
                    "error accessing the binary file '{}': the requested cycle number is not valid (cycle = {}); it must be in the range [1,{}]",
                    self.file_name(),
                    cycle,
                    self.cycle_count()
                ),
            ));
        }

        let samples = read_f64_block(
            &mut self.reader,
            self.layout.data_offset(cycle),
            self.layout.data_sample_count(),
            &self.path,
        )?;
        let mut components = samples
            .chunks_exact(self.layout.padded_cell_count())
            .map(|component| self.layout.strip_ghosts(component))
            .collect::<Result<Vec<_>, _>>()?;

        match self.layout.arity() {
            FieldArity::Scalar => Ok(FieldData::Scalar(components.remove(0))),
            FieldArity::Vector => {
                let azimuthal = components.remove(2);
                let radial = components.remove(1);
                let axial = components.remove(0);
                Ok(FieldData::Vector([axial, radial, azimuthal]))
            }
        }
    }
}

/// The stores for every selected field, indexed by [`FieldKind::slot`].
#[derive(Debug, Default)]
pub struct FieldStores {
    stores: [Option<TimeSeriesStore>; FIELD_COUNT],
}

impl FieldStores {
    pub fn open_selected(
        data_dir: &Path,
        dims: MeshDims,
        selection: &FieldSelection,
    ) -> HymResult<Self> {
        let mut stores = Self::default();
        for kind in selection.selected() {
            stores.insert(TimeSeriesStore::open_in(kind, data_dir, dims)?);
        }
        Ok(stores)
    }

    pub fn insert(&mut self, store: TimeSeriesStore) {
        let slot = store.kind().slot();
        self.stores[slot] = Some(store);
    }

    pub fn get(&self, kind: FieldKind) -> Option<&TimeSeriesStore> {
        self.stores[kind.slot()].as_ref()
    }

    pub fn get_mut(&mut self, kind: FieldKind) -> Option<&mut TimeSeriesStore> {
        self.stores[kind.slot()].as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSeriesStore> {
        self.stores.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Reconciles the nominal cycle count with what the files hold.
    ///
    /// The largest per-field count wins; every disagreement is logged.
    pub fn unify_cycle_count(&self, nominal: usize) -> usize {
        let mut largest = 0;
        for store in self.iter() {
            if store.cycle_count() != nominal {
                warn!(
                    field = %store.kind(),
                    file_cycles = store.cycle_count(),
                    status_cycles = nominal,
                    "cycle count differs from the status file"
                );
            }
            largest = largest.max(store.cycle_count());
        }

        if largest == 0 {
            warn!("no field data was found to convert; only meshes will be written");
            nominal
        } else if largest != nominal {
            warn!(cycles = largest, "the run cycle count has been changed");
            largest
        } else {
            nominal
        }
    }
}
