//! Timetable domain models.
//!
//! Reference data (weekdays, time slots, disciplines, professors), the
//! allocation records that populate the grid, and the payloads a drag
//! gesture can carry.
//!
//! # Grid Layout
//!
//! | Axis | Entity | Ordered by |
//! |------|--------|------------|
//! | Column | `Weekday` | `order` |
//! | Row | `TimeSlot` | `order` |
//! | Cell | `CellId` | (weekday, time slot) |
//! | Content | `Allocation` | at most one per cell |

mod allocation;
mod calendar;
mod discipline;
mod grid;
mod payload;
mod professor;

pub use allocation::{Allocation, AllocationRequest, AllocationSet, AllocationState, MergeOutcome};
pub use calendar::{ordered_time_slots, ordered_weekdays, parse_clock, CellId, TimeSlot, Weekday};
pub use discipline::Discipline;
pub use grid::{AllocationView, Catalog, GridData};
pub use payload::{DragPayload, DropEffect, DropEvent, PayloadKind};
pub use professor::Professor;
