//! Grid occupancy metrics.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total cells | weekdays × time slots |
//! | Fill rate | occupied cells / total cells |
//! | Staffed rate | cells with professors / occupied cells |
//! | Professor assignments | sum of professor counts over occupied cells |
//! | Per-discipline load | occupied cells per discipline ID |

use std::collections::HashMap;

use super::GridProjection;
use crate::models::AllocationState;

/// Occupancy indicators for a projected grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccupancySummary {
    /// Number of addressable cells.
    pub total_cells: usize,
    /// Cells without an allocation.
    pub empty: usize,
    /// Cells with a discipline and no professors.
    pub discipline_only: usize,
    /// Cells with a discipline and at least one professor.
    pub with_professors: usize,
    /// Occupied fraction (0.0..1.0).
    pub fill_rate: f64,
    /// Fraction of occupied cells that have professors (0.0..1.0).
    pub staffed_rate: f64,
    /// Total professor slots filled.
    pub professor_assignments: usize,
    /// Occupied cells per discipline ID.
    pub cells_by_discipline: HashMap<String, usize>,
}

impl OccupancySummary {
    /// Computes occupancy over the cells a projection lays out.
    ///
    /// Allocations addressed to cells outside the weekday/time slot axes
    /// are not counted.
    pub fn calculate(projection: &GridProjection<'_>) -> Self {
        let mut summary = Self::default();

        for cell in projection.cell_ids() {
            summary.total_cells += 1;
            match projection.state(&cell) {
                AllocationState::Empty => summary.empty += 1,
                AllocationState::DisciplineOnly => summary.discipline_only += 1,
                AllocationState::DisciplineWithProfessors => summary.with_professors += 1,
            }
            if let Some(view) = projection.allocation(&cell.weekday_id, &cell.time_slot_id) {
                summary.professor_assignments += view.allocation.professor_ids.len();
                *summary
                    .cells_by_discipline
                    .entry(view.allocation.discipline_id)
                    .or_insert(0) += 1;
            }
        }

        let occupied = summary.occupied();
        if summary.total_cells > 0 {
            summary.fill_rate = occupied as f64 / summary.total_cells as f64;
        }
        if occupied > 0 {
            summary.staffed_rate = summary.with_professors as f64 / occupied as f64;
        }
        summary
    }

    /// Cells holding an allocation.
    #[inline]
    pub fn occupied(&self) -> usize {
        self.discipline_only + self.with_professors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Allocation, AllocationSet, Catalog, CellId, TimeSlot, Weekday};

    fn catalog() -> Catalog {
        Catalog {
            weekdays: vec![Weekday::new("1", "Monday", 1), Weekday::new("2", "Tuesday", 2)],
            time_slots: vec![
                TimeSlot::new("1", "08:00", "09:00", 1),
                TimeSlot::new("2", "09:00", "10:00", 2),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_grid() {
        let catalog = catalog();
        let set = AllocationSet::new();
        let summary = GridProjection::new(&catalog, &set).summary();
        assert_eq!(summary.total_cells, 4);
        assert_eq!(summary.empty, 4);
        assert_eq!(summary.fill_rate, 0.0);
        assert_eq!(summary.staffed_rate, 0.0);
    }

    #[test]
    fn test_partial_grid() {
        let catalog = catalog();
        let mut set = AllocationSet::new();
        set.insert(Allocation::new("a", "1", &CellId::new("1", "1")).with_professors(["1", "2"]));
        set.insert(Allocation::new("b", "1", &CellId::new("2", "1")));
        set.insert(Allocation::new("c", "3", &CellId::new("2", "2")).with_professors(["1"]));

        let summary = GridProjection::new(&catalog, &set).summary();
        assert_eq!(summary.occupied(), 3);
        assert_eq!(summary.discipline_only, 1);
        assert_eq!(summary.with_professors, 2);
        assert_eq!(summary.professor_assignments, 3);
        assert!((summary.fill_rate - 0.75).abs() < 1e-10);
        assert!((summary.staffed_rate - 2.0 / 3.0).abs() < 1e-10);
        assert_eq!(summary.cells_by_discipline["1"], 2);
        assert_eq!(summary.cells_by_discipline["3"], 1);
    }
}
