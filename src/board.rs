//! Schedule board: the loaded grid and the drop pipeline.
//!
//! The board owns the reference tables and the confirmed allocation set,
//! and runs each drop through four stages:
//!
//! 1. **Compatibility**: the [`DropPolicy`] must accept the payload on the
//!    target's current state, otherwise the drop is rejected.
//! 2. **Reconciliation**: [`reconcile`] plans the mutations.
//! 3. **Persistence**: mutations go to the [`DataSource`] one at a time, in
//!    plan order, each awaited before the next.
//! 4. **Merge**: confirmed records are merged into the allocation set.
//!
//! Every mutating method takes `&mut self`, so a board never has two drops
//! in flight. Boards sharing one data source are kept apart by the version
//! token each write quotes.
//!
//! The set only ever holds confirmed records. A failed write leaves it as
//! it was; there is nothing to roll back and nothing is retried.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::compatibility::{DropPolicy, StandardPolicy};
use crate::error::{BoardError, Result, SourceError};
use crate::models::{
    Allocation, AllocationSet, AllocationState, Catalog, CellId, DragPayload, DropEffect,
    DropEvent, MergeOutcome, PayloadKind,
};
use crate::projection::GridProjection;
use crate::reconciler::{reconcile, Mutation, NoopReason, Reconciliation};
use crate::session::{drain_events, CellTracker, SessionEvent};
use crate::source::DataSource;
use crate::validation::validate_grid;

/// Board configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Refuse to load a grid with structural violations.
    pub reject_invalid_grid: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            reject_invalid_grid: true,
        }
    }
}

impl BoardConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether structurally invalid grids are refused on load.
    pub fn with_reject_invalid_grid(mut self, reject: bool) -> Self {
        self.reject_invalid_grid = reject;
        self
    }
}

/// What a drop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The policy does not accept the payload on the target.
    Rejected {
        /// Target state at the time of the drop.
        state: AllocationState,
    },
    /// The drop was legal but changed nothing.
    Unchanged(NoopReason),
    /// The allocation the drop referred to no longer exists.
    NotFound {
        /// ID of the missing allocation.
        allocation_id: String,
        /// Allocation already deleted from the target before the refusal.
        evicted: Option<String>,
    },
    /// The data source has moved on since the drop was planned: a newer
    /// version of the record, or another writer filled the target cell.
    /// Refresh and retry.
    Stale {
        /// ID of the contested allocation.
        allocation_id: String,
        /// Allocation already deleted from the target before the refusal.
        evicted: Option<String>,
    },
    /// A new allocation was created.
    Created(Allocation),
    /// An allocation was changed in place.
    Updated(Allocation),
    /// An allocation was moved to the target.
    Moved {
        /// The moved allocation, at its new cell.
        allocation: Allocation,
        /// ID of the allocation evicted from the target, if any.
        evicted: Option<String>,
    },
}

impl DropOutcome {
    /// Whether the drop changed the grid.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Created(_) | Self::Updated(_) | Self::Moved { .. })
    }
}

/// A timetable grid bound to its data source.
///
/// # Example
///
/// ```
/// use timetable_grid::board::{DropOutcome, ScheduleBoard};
/// use timetable_grid::models::{CellId, Discipline, DropEvent};
/// use timetable_grid::source::InMemorySource;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let mut board = ScheduleBoard::new(InMemorySource::demo());
/// board.load().await.unwrap();
///
/// let math = board.catalog().disciplines[0].clone();
/// let outcome = board
///     .handle_drop(DropEvent::new(math, CellId::new("1", "1")))
///     .await
///     .unwrap();
/// assert!(matches!(outcome, DropOutcome::Created(_)));
/// assert_eq!(board.allocations().len(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct ScheduleBoard<S> {
    source: S,
    policy: Arc<dyn DropPolicy>,
    config: BoardConfig,
    catalog: Catalog,
    allocations: AllocationSet,
    loaded: bool,
}

impl<S: DataSource> ScheduleBoard<S> {
    /// Creates an unloaded board with the standard policy.
    pub fn new(source: S) -> Self {
        Self {
            source,
            policy: Arc::new(StandardPolicy),
            config: BoardConfig::default(),
            catalog: Catalog::default(),
            allocations: AllocationSet::new(),
            loaded: false,
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: BoardConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the drop policy.
    pub fn with_policy(mut self, policy: Arc<dyn DropPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Fetches the grid from the data source, replacing anything held.
    ///
    /// Structural violations fail the load with
    /// [`BoardError::InvalidGrid`] unless disabled in [`BoardConfig`].
    /// Dangling references are only logged.
    pub async fn load(&mut self) -> Result<()> {
        let grid = self.source.fetch_grid().await?;

        if let Err(errors) = validate_grid(&grid) {
            let (structural, referential): (Vec<_>, Vec<_>) =
                errors.into_iter().partition(|e| e.is_structural());
            for error in &referential {
                warn!(kind = ?error.kind, "{}", error.message);
            }
            if !structural.is_empty() {
                if self.config.reject_invalid_grid {
                    warn!(errors = structural.len(), "grid rejected");
                    return Err(BoardError::InvalidGrid(structural));
                }
                for error in &structural {
                    warn!(kind = ?error.kind, "{}", error.message);
                }
            }
        }

        let (catalog, records) = grid.into_parts();
        let allocations = match AllocationSet::from_records(records.iter().cloned()) {
            Ok(set) => set,
            // only reachable with rejection disabled: last record per cell wins
            Err(_) => {
                let mut set = AllocationSet::new();
                for record in records {
                    set.insert(record);
                }
                set
            }
        };

        info!(
            weekdays = catalog.weekdays.len(),
            time_slots = catalog.time_slots.len(),
            allocations = allocations.len(),
            "grid loaded"
        );
        self.catalog = catalog;
        self.allocations = allocations;
        self.loaded = true;
        Ok(())
    }

    /// Reloads the grid, discarding the held allocation set.
    pub async fn refresh(&mut self) -> Result<()> {
        self.load().await
    }

    /// Whether a grid has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Reference tables.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Confirmed allocations.
    pub fn allocations(&self) -> &AllocationSet {
        &self.allocations
    }

    /// The data source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Active drop policy.
    pub fn policy(&self) -> &dyn DropPolicy {
        self.policy.as_ref()
    }

    /// Read-only projection of the current grid.
    pub fn projection(&self) -> GridProjection<'_> {
        GridProjection::new(&self.catalog, &self.allocations)
    }

    /// Whether `payload` may land on `cell` under the board's policy.
    pub fn can_drop(&self, cell: &CellId, payload: &DragPayload) -> bool {
        self.policy.can_drop(self.allocations.state_at(cell), payload)
    }

    /// Drop effect of `payload` on `cell` under the board's policy.
    pub fn drop_effect(&self, cell: &CellId, payload: &DragPayload) -> DropEffect {
        self.policy.drop_effect(self.allocations.state_at(cell), payload)
    }

    /// Cells a payload of `kind` may land on under the board's policy.
    pub fn valid_drop_targets(&self, kind: PayloadKind) -> std::collections::BTreeSet<CellId> {
        self.projection()
            .valid_drop_targets_with(self.policy.as_ref(), kind)
    }

    /// Runs a drop through compatibility, reconciliation and persistence.
    ///
    /// Returns `Err` only when the data source fails for a reason other
    /// than a missing or stale record; the allocation set then still holds
    /// every record confirmed before the failure.
    pub async fn handle_drop(&mut self, drop: DropEvent) -> Result<DropOutcome> {
        if !self.loaded {
            return Err(BoardError::NotLoaded);
        }

        let state = self.allocations.state_at(&drop.target);
        if !self.policy.can_drop(state, &drop.payload) {
            debug!(
                policy = self.policy.name(),
                kind = %drop.payload.kind(),
                cell = %drop.target,
                state = state.as_str(),
                "drop rejected"
            );
            return Ok(DropOutcome::Rejected { state });
        }

        let mutations = match reconcile(&self.allocations, &drop) {
            Reconciliation::Unchanged(reason) => {
                debug!(cell = %drop.target, %reason, "drop unchanged");
                return Ok(DropOutcome::Unchanged(reason));
            }
            Reconciliation::NotFound { allocation_id } => {
                debug!(id = %allocation_id, "dragged allocation is gone");
                return Ok(DropOutcome::NotFound {
                    allocation_id,
                    evicted: None,
                });
            }
            Reconciliation::Apply(mutations) => mutations,
        };

        self.execute(drop.payload.kind(), mutations).await
    }

    /// Deletes the allocation at `cell`, if any.
    pub async fn remove(&mut self, cell: &CellId) -> Result<Option<Allocation>> {
        if !self.loaded {
            return Err(BoardError::NotLoaded);
        }
        let Some(held) = self.allocations.get(cell).cloned() else {
            return Ok(None);
        };

        match self
            .source
            .delete_allocation(&held.id, Some(held.version))
            .await
        {
            Ok(()) | Err(SourceError::NotFound { .. }) => {
                info!(id = %held.id, cell = %cell, "allocation removed");
                Ok(self.allocations.remove(&held.id))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Creates a tracker for `cell`, primed with its current state and
    /// judging drops by the board's policy.
    pub fn tracker(&self, cell: CellId) -> CellTracker {
        let state = self.allocations.state_at(&cell);
        CellTracker::new(cell, state).with_policy(Arc::clone(&self.policy))
    }

    /// Refreshes trackers after a merge and feeds them pending session
    /// events.
    pub fn sync_trackers(
        &self,
        trackers: &mut [CellTracker],
        events: &mut broadcast::Receiver<SessionEvent>,
    ) {
        let pending = drain_events(events);
        for tracker in trackers.iter_mut() {
            tracker.set_state(self.allocations.state_at(tracker.cell()));
            for event in &pending {
                tracker.observe(event);
            }
        }
    }

    async fn execute(&mut self, kind: PayloadKind, mutations: Vec<Mutation>) -> Result<DropOutcome> {
        let mut evicted = None;
        let mut placed = None;

        for mutation in mutations {
            let (record, created) = match mutation {
                Mutation::Create(request) => match self.source.create_allocation(request).await {
                    Ok(record) => (record, true),
                    Err(err) => return self.refused(None, err, evicted),
                },
                Mutation::Update { id, request } => {
                    match self.source.update_allocation(&id, request).await {
                        Ok(record) => (record, false),
                        Err(err) => return self.refused(Some(id), err, evicted),
                    }
                }
                Mutation::Delete { id, expected_version } => {
                    match self.source.delete_allocation(&id, Some(expected_version)).await {
                        // already gone counts as evicted
                        Ok(()) | Err(SourceError::NotFound { .. }) => {
                            self.allocations.remove(&id);
                            evicted = Some(id);
                            continue;
                        }
                        Err(err) => return self.refused(Some(id), err, evicted),
                    }
                }
            };

            if let MergeOutcome::Stale { held } = self.allocations.merge(record.clone()) {
                warn!(id = %record.id, held, confirmed = record.version, "confirmation older than held record");
                return Ok(DropOutcome::Stale {
                    allocation_id: record.id,
                    evicted,
                });
            }
            placed = Some((record, created));
        }

        // every plan ends with the write that places the payload
        let (record, created) =
            placed.ok_or_else(|| SourceError::invalid_request("plan placed nothing"))?;
        let outcome = match kind {
            PayloadKind::Allocation => DropOutcome::Moved {
                allocation: record,
                evicted,
            },
            _ if created => DropOutcome::Created(record),
            PayloadKind::Discipline | PayloadKind::Professor => DropOutcome::Updated(record),
        };
        debug!(?outcome, "drop applied");
        Ok(outcome)
    }

    /// Classifies a refused write. Missing and contested records become
    /// outcomes; anything else is a persistence failure.
    fn refused(
        &mut self,
        id: Option<String>,
        err: SourceError,
        evicted: Option<String>,
    ) -> Result<DropOutcome> {
        match err {
            SourceError::NotFound { id: missing } => {
                warn!(id = %missing, "allocation vanished from the data source");
                self.allocations.remove(&missing);
                Ok(DropOutcome::NotFound {
                    allocation_id: missing,
                    evicted,
                })
            }
            SourceError::StaleVersion {
                id: contested,
                expected,
                actual,
            } => {
                warn!(id = %contested, expected, actual, "stale write refused");
                Ok(DropOutcome::Stale {
                    allocation_id: contested,
                    evicted,
                })
            }
            SourceError::CellOccupied { cell, occupant } => {
                warn!(cell = %cell, %occupant, writer = ?id, "target filled by another writer");
                Ok(DropOutcome::Stale {
                    allocation_id: occupant,
                    evicted,
                })
            }
            err => {
                if let Some(lost) = &evicted {
                    warn!(evicted = %lost, "write failed after eviction");
                }
                Err(err.into())
            }
        }
    }
}
