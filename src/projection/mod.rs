//! Grid projection: per-cell display state derived from the allocation set.
//!
//! Nothing here is cached. Every accessor reads the current
//! [`AllocationSet`](crate::models::AllocationSet), so a projection taken
//! after a merge can never disagree with the set it was built from.
//!
//! # Accessors
//!
//! - `allocation(w, t)`: enriched allocation for one cell
//! - `state(cell)` / `slot_state(w, t)`: derived [`AllocationState`]
//! - `rows()` / `cells()`: the whole grid in display order
//! - `valid_drop_targets(kind)`: cells a payload kind may land on
//! - `summary()`: occupancy counts

mod layout;
mod summary;

pub use layout::{CellView, GridProjection, GridRow};
pub use summary::OccupancySummary;

use crate::models::{Allocation, AllocationState};

/// Three-way classification of a cell's allocation.
#[inline]
pub fn classify(allocation: Option<&Allocation>) -> AllocationState {
    AllocationState::of(allocation)
}
