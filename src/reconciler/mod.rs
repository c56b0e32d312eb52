//! Allocation reconciler.
//!
//! Turns a completed drop into the mutations the data source must perform.
//! Planning is pure: [`reconcile`] reads the current [`AllocationSet`] and
//! returns a [`Reconciliation`]; persisting it is the board's job.
//!
//! # Algorithm
//!
//! 1. **Discipline drop.** Occupied target: update its discipline, keeping
//!    the professors. Empty target: create a discipline-only allocation.
//! 2. **Professor drop.** Target must hold an allocation with a discipline,
//!    otherwise nothing happens. The professor is appended with set
//!    semantics, so a repeated drop changes nothing.
//! 3. **Allocation move.** Same cell: nothing happens. Otherwise the
//!    target's occupant (if any) is deleted first, then the moved record is
//!    re-keyed to the target. One record per moved allocation is alive
//!    at every step.
//!
//! Updates and deletes quote the version they were planned against.

mod plan;

pub use plan::reconcile;

use std::fmt;

use crate::models::{Allocation, AllocationRequest, AllocationSet};

/// A single write against the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Create an allocation.
    Create(AllocationRequest),
    /// Update an allocation in place (possibly re-keying its cell).
    Update {
        /// Allocation to update.
        id: String,
        /// Fields to change.
        request: AllocationRequest,
    },
    /// Delete an allocation.
    Delete {
        /// Allocation to delete.
        id: String,
        /// Version the deletion was planned against.
        expected_version: u64,
    },
}

/// Why a drop produced no mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoopReason {
    /// An allocation was dropped back onto its own cell.
    SameCell,
    /// The professor is already assigned to the target.
    AlreadyAssigned,
    /// The target already holds the dropped discipline.
    SameDiscipline,
    /// A professor was dropped where no discipline is allocated.
    MissingDiscipline,
}

impl fmt::Display for NoopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::SameCell => "allocation dropped on its own cell",
            Self::AlreadyAssigned => "professor already assigned",
            Self::SameDiscipline => "discipline already allocated",
            Self::MissingDiscipline => "no discipline allocated in target cell",
        };
        f.write_str(reason)
    }
}

/// Result of planning a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing to do; the drop was redundant or unsupported by the target.
    Unchanged(NoopReason),
    /// The dragged allocation no longer exists in the current set.
    NotFound {
        /// ID of the missing allocation.
        allocation_id: String,
    },
    /// Perform these mutations, in order.
    Apply(Vec<Mutation>),
}

impl Reconciliation {
    /// Mutations to perform (empty unless `Apply`).
    pub fn mutations(&self) -> &[Mutation] {
        match self {
            Self::Apply(mutations) => mutations,
            Self::Unchanged(_) | Self::NotFound { .. } => &[],
        }
    }

    /// Whether the plan writes nothing.
    pub fn is_noop(&self) -> bool {
        self.mutations().is_empty()
    }

    /// The allocation set this plan yields once every mutation is confirmed.
    ///
    /// Created records get a provisional `pending:<cell>` ID; the data
    /// source assigns the real one.
    pub fn preview(&self, current: &AllocationSet) -> AllocationSet {
        let mut next = current.clone();
        for mutation in self.mutations() {
            match mutation {
                Mutation::Create(request) => {
                    let cell = request.cell();
                    let mut id = format!("pending:{cell}");
                    let mut attempt = 1;
                    while next.find(&id).is_some() {
                        attempt += 1;
                        id = format!("pending:{cell}#{attempt}");
                    }
                    let mut record = Allocation::new(
                        id,
                        request.discipline_id.clone().unwrap_or_default(),
                        &cell,
                    );
                    for id in request.professor_ids.iter().flatten() {
                        record.add_professor(id.clone());
                    }
                    next.insert(record);
                }
                Mutation::Update { id, request } => {
                    if let Some(updated) = next.find(id).map(|held| held.updated_with(request)) {
                        next.insert(updated);
                    }
                }
                Mutation::Delete { id, .. } => {
                    next.remove(id);
                }
            }
        }
        next
    }
}
