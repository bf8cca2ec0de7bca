//! Per-cycle reconciliation of presence and time across fields.

mod report;

pub use report::{render_report, write_report};

use crate::common::constants::TIME_SENTINEL;
use crate::domain::{FIELD_COUNT, FieldKind, FieldSelection};
use crate::store::FieldStores;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    Clean,
    Data,
    Time,
}

impl CycleStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "Clean",
            Self::Data => "Data",
            Self::Time => "Time",
        }
    }
}

impl Display for CycleStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The evaluated state of one output cycle.
///
/// Built in a single pass by [`CycleUnit::build`]; there is no partially
/// evaluated form.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleUnit {
    cycle: usize,
    time: f64,
    presence: [bool; FIELD_COUNT],
    write_eligible: bool,
    time_inconsistent: bool,
    data_inconsistent: bool,
}

impl CycleUnit {
    pub fn build(cycle: usize, stores: &FieldStores, requested: &FieldSelection) -> Self {
        let mut presence = [false; FIELD_COUNT];
        for kind in FieldKind::ALL {
            presence[kind.slot()] = stores
                .get(kind)
                .is_some_and(|store| store.is_present(cycle));
        }

        let write_eligible = presence.iter().any(|present| *present);
        let data_inconsistent = FieldKind::ALL
            .iter()
            .any(|kind| presence[kind.slot()] != requested.is_selected(*kind));

        let mut time = 0.0;
        let mut time_inconsistent = false;
        let mut found_first = false;
        let present_times = FieldKind::ALL
            .iter()
            .filter(|kind| presence[kind.slot()])
            .filter_map(|kind| stores.get(*kind).and_then(|store| store.time(cycle)));
        for value in present_times {
            if !found_first {
                time = value;
                found_first = true;
            } else if value != time {
                time_inconsistent = true;
            }
        }
        if time_inconsistent {
            time = TIME_SENTINEL;
        }

        Self {
            cycle,
            time,
            presence,
            write_eligible,
            time_inconsistent,
            data_inconsistent,
        }
    }

    pub const fn cycle(&self) -> usize {
        self.cycle
    }

    /// Canonical time; [`TIME_SENTINEL`] when the fields disagree.
    pub const fn time(&self) -> f64 {
        self.time
    }

    pub const fn should_write(&self) -> bool {
        self.write_eligible
    }

    pub const fn is_time_inconsistent(&self) -> bool {
        self.time_inconsistent
    }

    pub const fn is_present(&self, kind: FieldKind) -> bool {
        self.presence[kind.slot()]
    }

    pub fn present_fields(&self) -> impl Iterator<Item = FieldKind> + '_ {
        FieldKind::ALL
            .into_iter()
            .filter(|kind| self.is_present(*kind))
    }

    pub fn status(&self) -> CycleStatus {
        if self.time_inconsistent {
            CycleStatus::Time
        } else if self.data_inconsistent {
            CycleStatus::Data
        } else {
            CycleStatus::Clean
        }
    }

    pub fn needs_report(&self) -> bool {
        self.time_inconsistent || self.data_inconsistent || !self.write_eligible
    }

    /// Presence digits in field order, e.g. `10100`.
    pub fn mask_digits(&self) -> String {
        self.presence
            .iter()
            .map(|present| if *present { '1' } else { '0' })
            .collect()
    }
}
