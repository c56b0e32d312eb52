//! Persistence boundary.
//!
//! The board never writes to its allocation set directly: every change goes
//! through a [`DataSource`], and only the records it confirms are merged.
//!
//! # Contract
//!
//! - Mutating calls return the full confirmed record.
//! - Update merge semantics: absent `disciplineId` / `professorIds` keep the
//!   stored values; weekday and time slot always come from the request.
//! - A request quoting `expected_version` is refused with
//!   [`SourceError::StaleVersion`] when the stored record has moved on.
//! - The store never places two allocations in one cell
//!   ([`SourceError::CellOccupied`]).

mod memory;

pub use memory::{demo_grid, InMemorySource, MemorySourceConfig};

use std::future::Future;

use crate::error::SourceError;
use crate::models::{Allocation, AllocationRequest, GridData};

/// Async backing store for a timetable.
pub trait DataSource: Send + Sync {
    /// Fetches reference data and current allocations.
    fn fetch_grid(&self) -> impl Future<Output = Result<GridData, SourceError>> + Send;

    /// Creates an allocation. The source assigns the ID and initial version.
    fn create_allocation(
        &self,
        request: AllocationRequest,
    ) -> impl Future<Output = Result<Allocation, SourceError>> + Send;

    /// Updates an allocation, bumping its version.
    fn update_allocation(
        &self,
        id: &str,
        request: AllocationRequest,
    ) -> impl Future<Output = Result<Allocation, SourceError>> + Send;

    /// Deletes an allocation, optionally guarded by the version it was
    /// planned against.
    fn delete_allocation(
        &self,
        id: &str,
        expected_version: Option<u64>,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;
}
