//! Ordered grid layout and per-cell views.

use std::collections::BTreeSet;

use serde::Serialize;

use super::OccupancySummary;
use crate::compatibility::{DropPolicy, StandardPolicy};
use crate::models::{
    ordered_time_slots, ordered_weekdays, AllocationSet, AllocationState, AllocationView, Catalog,
    CellId, Discipline, PayloadKind, TimeSlot, Weekday,
};

/// Display state of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    /// Cell address.
    pub cell: CellId,
    /// Derived state.
    pub state: AllocationState,
    /// Enriched allocation, if the cell is occupied.
    pub allocation: Option<AllocationView>,
    /// Discipline label to render, when the discipline is known.
    pub label: Option<String>,
}

/// One time slot across every weekday, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    /// The row's time slot.
    pub time_slot: TimeSlot,
    /// Cells, one per weekday.
    pub cells: Vec<CellView>,
}

/// Read-only view of a grid: reference tables plus the allocation set.
///
/// # Example
///
/// ```
/// use timetable_grid::models::{AllocationSet, Catalog, PayloadKind, TimeSlot, Weekday};
/// use timetable_grid::projection::GridProjection;
///
/// let catalog = Catalog {
///     weekdays: vec![Weekday::new("1", "Monday", 1)],
///     time_slots: vec![TimeSlot::new("1", "08:00", "09:00", 1)],
///     ..Default::default()
/// };
/// let allocations = AllocationSet::new();
/// let projection = GridProjection::new(&catalog, &allocations);
/// assert_eq!(projection.valid_drop_targets(PayloadKind::Discipline).len(), 1);
/// assert!(projection.valid_drop_targets(PayloadKind::Professor).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct GridProjection<'a> {
    catalog: &'a Catalog,
    allocations: &'a AllocationSet,
    weekdays: Vec<&'a Weekday>,
    time_slots: Vec<&'a TimeSlot>,
}

impl<'a> GridProjection<'a> {
    /// Creates a projection over a catalog and its allocations.
    pub fn new(catalog: &'a Catalog, allocations: &'a AllocationSet) -> Self {
        Self {
            catalog,
            allocations,
            weekdays: ordered_weekdays(&catalog.weekdays),
            time_slots: ordered_time_slots(&catalog.time_slots),
        }
    }

    /// Weekdays in column order.
    pub fn weekdays(&self) -> &[&'a Weekday] {
        &self.weekdays
    }

    /// Time slots in row order.
    pub fn time_slots(&self) -> &[&'a TimeSlot] {
        &self.time_slots
    }

    /// Enriched allocation at a cell.
    pub fn allocation(&self, weekday_id: &str, time_slot_id: &str) -> Option<AllocationView> {
        self.allocations.at(weekday_id, time_slot_id).map(|a| {
            AllocationView::resolve(a, &self.catalog.disciplines, &self.catalog.professors)
        })
    }

    /// Derived state of a cell.
    pub fn state(&self, cell: &CellId) -> AllocationState {
        self.allocations.state_at(cell)
    }

    /// Derived state of the slot `time_slot_id` on `weekday_id`.
    pub fn slot_state(&self, weekday_id: &str, time_slot_id: &str) -> AllocationState {
        AllocationState::of(self.allocations.at(weekday_id, time_slot_id))
    }

    /// Every cell address, row by row.
    pub fn cell_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.time_slots.iter().flat_map(move |slot| {
            self.weekdays
                .iter()
                .map(move |day| CellId::new(day.id.clone(), slot.id.clone()))
        })
    }

    /// View of one cell.
    pub fn cell(&self, cell: &CellId) -> CellView {
        let allocation = self.allocation(&cell.weekday_id, &cell.time_slot_id);
        let label = allocation
            .as_ref()
            .and_then(|view| view.discipline.as_ref())
            .map(Discipline::label);
        CellView {
            cell: cell.clone(),
            state: self.state(cell),
            allocation,
            label,
        }
    }

    /// Every cell view, row by row.
    pub fn cells(&self) -> Vec<CellView> {
        self.cell_ids().map(|cell| self.cell(&cell)).collect()
    }

    /// The grid as display rows.
    pub fn rows(&self) -> Vec<GridRow> {
        self.time_slots
            .iter()
            .map(|slot| GridRow {
                time_slot: (*slot).clone(),
                cells: self
                    .weekdays
                    .iter()
                    .map(|day| self.cell(&CellId::new(day.id.clone(), slot.id.clone())))
                    .collect(),
            })
            .collect()
    }

    /// Cells a payload of `kind` may land on under the standard rules.
    pub fn valid_drop_targets(&self, kind: PayloadKind) -> BTreeSet<CellId> {
        self.valid_drop_targets_with(&StandardPolicy, kind)
    }

    /// Cells a payload of `kind` may land on under `policy`.
    pub fn valid_drop_targets_with(&self, policy: &dyn DropPolicy, kind: PayloadKind) -> BTreeSet<CellId> {
        self.cell_ids()
            .filter(|cell| policy.accepts(self.state(cell), kind))
            .collect()
    }

    /// Occupancy counts for the visible grid.
    pub fn summary(&self) -> OccupancySummary {
        OccupancySummary::calculate(self)
    }
}
