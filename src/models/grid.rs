//! Grid snapshot and enriched allocation views.

use serde::{Deserialize, Serialize};

use super::{Allocation, AllocationState, Discipline, Professor, TimeSlot, Weekday};

/// Everything a data source returns for one timetable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridData {
    /// Day columns.
    pub weekdays: Vec<Weekday>,
    /// Period rows.
    pub time_slots: Vec<TimeSlot>,
    /// Discipline palette.
    pub disciplines: Vec<Discipline>,
    /// Professor palette.
    pub professors: Vec<Professor>,
    /// Current allocations.
    pub allocations: Vec<Allocation>,
}

impl GridData {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a weekday column.
    pub fn with_weekday(mut self, weekday: Weekday) -> Self {
        self.weekdays.push(weekday);
        self
    }

    /// Adds a time slot row.
    pub fn with_time_slot(mut self, time_slot: TimeSlot) -> Self {
        self.time_slots.push(time_slot);
        self
    }

    /// Adds a discipline to the palette.
    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.disciplines.push(discipline);
        self
    }

    /// Adds a professor to the palette.
    pub fn with_professor(mut self, professor: Professor) -> Self {
        self.professors.push(professor);
        self
    }

    /// Adds an allocation.
    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocations.push(allocation);
        self
    }

    /// Number of addressable cells (weekdays × time slots).
    pub fn cell_count(&self) -> usize {
        self.weekdays.len() * self.time_slots.len()
    }

    /// Discipline by ID.
    pub fn discipline(&self, id: &str) -> Option<&Discipline> {
        self.disciplines.iter().find(|d| d.id == id)
    }

    /// Professor by ID.
    pub fn professor(&self, id: &str) -> Option<&Professor> {
        self.professors.iter().find(|p| p.id == id)
    }
}

/// The reference tables of a grid: everything except the allocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Day columns.
    pub weekdays: Vec<Weekday>,
    /// Period rows.
    pub time_slots: Vec<TimeSlot>,
    /// Discipline palette.
    pub disciplines: Vec<Discipline>,
    /// Professor palette.
    pub professors: Vec<Professor>,
}

impl GridData {
    /// Splits the snapshot into reference tables and allocations.
    pub fn into_parts(self) -> (Catalog, Vec<Allocation>) {
        let catalog = Catalog {
            weekdays: self.weekdays,
            time_slots: self.time_slots,
            disciplines: self.disciplines,
            professors: self.professors,
        };
        (catalog, self.allocations)
    }
}


/// An allocation with its discipline and professors resolved.
///
/// IDs that do not resolve are left out: the view never invents data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationView {
    /// The raw record.
    #[serde(flatten)]
    pub allocation: Allocation,
    /// Resolved discipline, if the ID is known.
    pub discipline: Option<Discipline>,
    /// Resolved professors, in the allocation's order.
    pub professors: Vec<Professor>,
}

impl AllocationView {
    /// Resolves an allocation against the reference tables.
    pub fn resolve(allocation: &Allocation, disciplines: &[Discipline], professors: &[Professor]) -> Self {
        let discipline = disciplines
            .iter()
            .find(|d| d.id == allocation.discipline_id)
            .cloned();
        let professors = allocation
            .professor_ids
            .iter()
            .filter_map(|id| professors.iter().find(|p| &p.id == id))
            .cloned()
            .collect();
        Self {
            allocation: allocation.clone(),
            discipline,
            professors,
        }
    }

    /// Derived cell state.
    pub fn state(&self) -> AllocationState {
        self.allocation.state()
    }
}
