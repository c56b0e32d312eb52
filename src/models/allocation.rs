//! Allocation model and the per-cell allocation set.
//!
//! An allocation binds one discipline and zero or more professors to one
//! grid cell. The [`AllocationSet`] is keyed by cell, so the grid's central
//! invariant (at most one allocation per cell) holds by construction.
//!
//! # State Machine
//!
//! | State | Condition |
//! |-------|-----------|
//! | `Empty` | no allocation in the cell |
//! | `DisciplineOnly` | allocation with no professors |
//! | `DisciplineWithProfessors` | allocation with one or more professors |
//!
//! # Versioning
//! Every allocation carries a `version` assigned by the data source and
//! bumped on each confirmed update. Writes quote the version they were
//! derived from; a confirmation older than the record already held is
//! discarded on merge.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

use super::CellId;

/// Occupancy state of a grid cell, derived from its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationState {
    /// No allocation.
    Empty,
    /// A discipline without professors.
    DisciplineOnly,
    /// A discipline with at least one professor.
    DisciplineWithProfessors,
}

impl AllocationState {
    /// Classifies a cell by its allocation (or absence of one).
    pub fn of(allocation: Option<&Allocation>) -> Self {
        match allocation {
            None => Self::Empty,
            Some(a) if a.professor_ids.is_empty() => Self::DisciplineOnly,
            Some(_) => Self::DisciplineWithProfessors,
        }
    }

    /// Whether the cell holds an allocation.
    #[inline]
    pub fn is_occupied(self) -> bool {
        self != Self::Empty
    }

    /// Stable string form (`"empty"`, `"discipline-only"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::DisciplineOnly => "discipline-only",
            Self::DisciplineWithProfessors => "discipline-with-professors",
        }
    }
}

/// A discipline (plus professors) placed in one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Unique allocation identifier (assigned by the data source).
    pub id: String,
    /// Allocated discipline. Never empty for a stored allocation.
    pub discipline_id: String,
    /// Assigned professors, without duplicates.
    #[serde(default)]
    pub professor_ids: Vec<String>,
    /// Weekday (column) of the cell.
    pub weekday_id: String,
    /// Time slot (row) of the cell.
    pub time_slot_id: String,
    /// Optimistic concurrency token.
    #[serde(default)]
    pub version: u64,
}

impl Allocation {
    /// Creates a discipline-only allocation at a cell.
    pub fn new(id: impl Into<String>, discipline_id: impl Into<String>, cell: &CellId) -> Self {
        Self {
            id: id.into(),
            discipline_id: discipline_id.into(),
            professor_ids: Vec::new(),
            weekday_id: cell.weekday_id.clone(),
            time_slot_id: cell.time_slot_id.clone(),
            version: 0,
        }
    }

    /// Adds professors, skipping any already present.
    pub fn with_professors<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.add_professor(id);
        }
        self
    }

    /// Sets the version.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// The cell this allocation occupies.
    pub fn cell(&self) -> CellId {
        CellId::new(self.weekday_id.clone(), self.time_slot_id.clone())
    }

    /// Whether this allocation occupies the given cell.
    #[inline]
    pub fn is_at(&self, cell: &CellId) -> bool {
        cell.is_at(&self.weekday_id, &self.time_slot_id)
    }

    /// Derived cell state.
    #[inline]
    pub fn state(&self) -> AllocationState {
        AllocationState::of(Some(self))
    }

    /// Whether a professor is already assigned.
    pub fn has_professor(&self, professor_id: &str) -> bool {
        self.professor_ids.iter().any(|p| p == professor_id)
    }

    /// Applies an update request, producing the next version.
    ///
    /// Absent request fields keep the current value; the cell always comes
    /// from the request.
    pub fn updated_with(&self, request: &AllocationRequest) -> Self {
        let mut next = Self {
            id: self.id.clone(),
            discipline_id: request
                .discipline_id
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| self.discipline_id.clone()),
            professor_ids: Vec::new(),
            weekday_id: request.weekday_id.clone(),
            time_slot_id: request.time_slot_id.clone(),
            version: self.version + 1,
        };
        let professors = request.professor_ids.as_ref().unwrap_or(&self.professor_ids);
        for id in professors {
            next.add_professor(id.clone());
        }
        next
    }

    /// Adds a professor with set semantics.
    ///
    /// Returns `false` if the professor was already assigned.
    pub fn add_professor(&mut self, professor_id: impl Into<String>) -> bool {
        let professor_id = professor_id.into();
        if self.has_professor(&professor_id) {
            return false;
        }
        self.professor_ids.push(professor_id);
        true
    }
}

/// Payload for creating or updating an allocation through a data source.
///
/// On update, `None` fields keep their stored value; the cell is always
/// taken from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    /// New discipline, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discipline_id: Option<String>,
    /// Full replacement professor list, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professor_ids: Option<Vec<String>>,
    /// Target weekday.
    pub weekday_id: String,
    /// Target time slot.
    pub time_slot_id: String,
    /// Version the request was derived from (updates only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

impl AllocationRequest {
    /// Creates a request addressed to a cell, changing nothing else.
    pub fn at(cell: &CellId) -> Self {
        Self {
            discipline_id: None,
            professor_ids: None,
            weekday_id: cell.weekday_id.clone(),
            time_slot_id: cell.time_slot_id.clone(),
            expected_version: None,
        }
    }

    /// Sets the discipline.
    pub fn with_discipline(mut self, discipline_id: impl Into<String>) -> Self {
        self.discipline_id = Some(discipline_id.into());
        self
    }

    /// Sets the full professor list.
    pub fn with_professors(mut self, professor_ids: Vec<String>) -> Self {
        self.professor_ids = Some(professor_ids);
        self
    }

    /// Quotes the version this request was derived from.
    pub fn expecting(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }

    /// Target cell.
    pub fn cell(&self) -> CellId {
        CellId::new(self.weekday_id.clone(), self.time_slot_id.clone())
    }
}

/// Result of merging a confirmed record into an [`AllocationSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The record was stored. `displaced` holds a different allocation
    /// that previously sat in the same cell, if any.
    Applied {
        /// Allocation evicted from the target cell.
        displaced: Option<Allocation>,
    },
    /// The set already held a newer version of this record.
    Stale {
        /// Version currently held.
        held: u64,
    },
}

/// The grid's allocations, at most one per cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationSet {
    by_cell: BTreeMap<CellId, Allocation>,
}

impl AllocationSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from records, rejecting the first cell claimed twice.
    pub fn from_records(records: impl IntoIterator<Item = Allocation>) -> Result<Self, CellId> {
        let mut set = Self::new();
        for record in records {
            let cell = record.cell();
            if set.by_cell.contains_key(&cell) {
                return Err(cell);
            }
            set.by_cell.insert(cell, record);
        }
        Ok(set)
    }

    /// Number of allocations.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_cell.len()
    }

    /// Whether the grid is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_cell.is_empty()
    }

    /// Allocation at a cell.
    pub fn get(&self, cell: &CellId) -> Option<&Allocation> {
        self.by_cell.get(cell)
    }

    /// Allocation at the given coordinates.
    pub fn at(&self, weekday_id: &str, time_slot_id: &str) -> Option<&Allocation> {
        self.get(&CellId::new(weekday_id, time_slot_id))
    }

    /// Allocation by ID.
    pub fn find(&self, id: &str) -> Option<&Allocation> {
        self.by_cell.values().find(|a| a.id == id)
    }

    /// Derived state of a cell.
    pub fn state_at(&self, cell: &CellId) -> AllocationState {
        AllocationState::of(self.get(cell))
    }

    /// Iterates allocations in cell order.
    pub fn iter(&self) -> btree_map::Values<'_, CellId, Allocation> {
        self.by_cell.values()
    }

    /// Cells currently occupied.
    pub fn occupied_cells(&self) -> impl Iterator<Item = &CellId> {
        self.by_cell.keys()
    }

    /// Places a record in its cell, replacing whatever sat there and
    /// dropping any older placement of the same ID elsewhere.
    ///
    /// Returns the replaced occupant of the target cell if it was a
    /// different allocation.
    pub fn insert(&mut self, record: Allocation) -> Option<Allocation> {
        self.remove(&record.id);
        self.by_cell.insert(record.cell(), record)
    }

    /// Merges a record confirmed by the data source.
    ///
    /// A confirmation carrying an older version than the record already
    /// held under the same ID is ignored.
    pub fn merge(&mut self, confirmed: Allocation) -> MergeOutcome {
        if let Some(held) = self.find(&confirmed.id) {
            if held.version > confirmed.version {
                return MergeOutcome::Stale { held: held.version };
            }
        }
        let displaced = self.insert(confirmed);
        MergeOutcome::Applied { displaced }
    }

    /// Removes an allocation by ID.
    pub fn remove(&mut self, id: &str) -> Option<Allocation> {
        let cell = self.find(id).map(Allocation::cell)?;
        self.by_cell.remove(&cell)
    }

    /// Copies the allocations out, in cell order.
    pub fn to_vec(&self) -> Vec<Allocation> {
        self.by_cell.values().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a AllocationSet {
    type Item = &'a Allocation;
    type IntoIter = btree_map::Values<'a, CellId, Allocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.by_cell.values()
    }
}
