//! Drag session lifecycle.
//!
//! A [`DragCoordinator`] owns the single active drag. Starting a drag
//! returns a [`DragSession`] handle and broadcasts [`SessionEvent::Started`];
//! ending it (drop or cancel) broadcasts [`SessionEvent::Ended`]. Starting a
//! new drag while one is active ends the old one first, as `Superseded`.
//! There is no queueing.
//!
//! Cells do not read shared state. Each keeps a [`CellTracker`] fed from a
//! subscription and classifies itself against the payload it was told about.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, trace};

use crate::compatibility::{DropPolicy, StandardPolicy};
use crate::models::{AllocationState, CellId, DragPayload, DropEffect};

/// Identifier of one drag session, unique per coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// How a drag session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The payload was dropped on a cell.
    Dropped,
    /// The user released outside any target or pressed escape.
    Cancelled,
    /// A new drag started before this one ended.
    Superseded,
}

/// Lifecycle notification sent to every subscribed cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A drag started carrying `payload`.
    Started {
        /// Session that started.
        session: SessionId,
        /// What is being dragged.
        payload: Arc<DragPayload>,
    },
    /// A drag ended.
    Ended {
        /// Session that ended.
        session: SessionId,
        /// Why it ended.
        outcome: SessionEnd,
    },
}

/// Handle to an active drag, held by whoever coordinates the gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    id: SessionId,
    payload: Arc<DragPayload>,
}

impl DragSession {
    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Dragged payload.
    pub fn payload(&self) -> &DragPayload {
        &self.payload
    }
}

/// Owner of the process-wide drag session.
#[derive(Debug)]
pub struct DragCoordinator {
    sender: broadcast::Sender<SessionEvent>,
    active: Option<DragSession>,
    next_id: u64,
}

impl Default for DragCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl DragCoordinator {
    /// Default event buffer per subscriber.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Creates a coordinator with the default event buffer.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a coordinator buffering up to `capacity` events per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            active: None,
            next_id: 1,
        }
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Active session, if any.
    pub fn active(&self) -> Option<&DragSession> {
        self.active.as_ref()
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a drag, superseding any active one.
    pub fn begin(&mut self, payload: DragPayload) -> DragSession {
        if let Some(previous) = self.active.take() {
            self.publish(SessionEvent::Ended {
                session: previous.id,
                outcome: SessionEnd::Superseded,
            });
        }

        let session = DragSession {
            id: SessionId(self.next_id),
            payload: Arc::new(payload),
        };
        self.next_id += 1;
        debug!(session = session.id.0, kind = %session.payload.kind(), "drag started");

        self.publish(SessionEvent::Started {
            session: session.id,
            payload: Arc::clone(&session.payload),
        });
        self.active = Some(session.clone());
        session
    }

    /// Ends `session`. Returns `false` if it is no longer the active one.
    pub fn end(&mut self, session: &DragSession, outcome: SessionEnd) -> bool {
        match &self.active {
            Some(active) if active.id == session.id => {
                self.active = None;
                debug!(session = session.id.0, ?outcome, "drag ended");
                self.publish(SessionEvent::Ended {
                    session: session.id,
                    outcome,
                });
                true
            }
            _ => false,
        }
    }

    fn publish(&self, event: SessionEvent) {
        // no subscribers is fine: nothing is listening yet
        if self.sender.send(event).is_err() {
            trace!("session event dropped, no subscribers");
        }
    }
}

/// Hover feedback for a cell during a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    /// Not hovered, or no drag in progress.
    Idle,
    /// Hovered by a payload that may land here.
    Valid,
    /// Hovered by a payload that may not land here.
    Invalid,
}

/// Drains every pending event from a subscription, oldest first.
///
/// A lagged receiver skips the lost events and keeps reading; the newest
/// events are enough to rebuild the current session.
pub fn drain_events(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut pending = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => pending.push(event),
            Err(TryRecvError::Lagged(skipped)) => {
                debug!(skipped, "session subscriber lagged");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    pending
}

/// Per-cell view of the drag session.
#[derive(Debug, Clone)]
pub struct CellTracker {
    cell: CellId,
    state: AllocationState,
    policy: Arc<dyn DropPolicy>,
    session: Option<(SessionId, Arc<DragPayload>)>,
    hovered: bool,
}

impl CellTracker {
    /// Creates a tracker for a cell in `state`, judged by the standard rules.
    pub fn new(cell: CellId, state: AllocationState) -> Self {
        Self {
            cell,
            state,
            policy: Arc::new(StandardPolicy),
            session: None,
            hovered: false,
        }
    }

    /// Judges drops with `policy` instead of the standard rules.
    pub fn with_policy(mut self, policy: Arc<dyn DropPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Tracked cell.
    pub fn cell(&self) -> &CellId {
        &self.cell
    }

    /// Last known cell state.
    pub fn state(&self) -> AllocationState {
        self.state
    }

    /// Updates the cell state after a reprojection.
    pub fn set_state(&mut self, state: AllocationState) {
        self.state = state;
    }

    /// Payload of the session this cell knows about.
    pub fn payload(&self) -> Option<&DragPayload> {
        self.session.as_ref().map(|(_, payload)| payload.as_ref())
    }

    /// Applies one session event.
    pub fn observe(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Started { session, payload } => {
                self.session = Some((*session, Arc::clone(payload)));
                self.hovered = false;
            }
            SessionEvent::Ended { session, .. } => {
                if self.session.as_ref().is_some_and(|(id, _)| id == session) {
                    self.session = None;
                    self.hovered = false;
                }
            }
        }
    }

    /// Drains pending events from a subscription. Returns how many were applied.
    pub fn sync(&mut self, events: &mut broadcast::Receiver<SessionEvent>) -> usize {
        let pending = drain_events(events);
        for event in &pending {
            self.observe(event);
        }
        pending.len()
    }

    /// Pointer entered the cell.
    pub fn enter(&mut self) {
        self.hovered = true;
    }

    /// Pointer left the cell, or the payload was released on it.
    pub fn leave(&mut self) {
        self.hovered = false;
    }

    /// Whether the active payload may land here under `policy`.
    ///
    /// `None` when no drag is in progress.
    pub fn accepts_with(&self, policy: &dyn DropPolicy) -> Option<bool> {
        self.payload().map(|payload| policy.can_drop(self.state, payload))
    }

    /// Whether the active payload may land here under the tracker's policy.
    pub fn accepts(&self) -> Option<bool> {
        self.accepts_with(self.policy.as_ref())
    }

    /// Drop effect the active payload would have here.
    pub fn drop_effect(&self) -> DropEffect {
        self.payload()
            .map_or(DropEffect::None, |payload| self.policy.drop_effect(self.state, payload))
    }

    /// Current hover feedback.
    pub fn highlight(&self) -> Highlight {
        if !self.hovered {
            return Highlight::Idle;
        }
        match self.accepts() {
            Some(true) => Highlight::Valid,
            // hovered with nothing being dragged counts as invalid
            Some(false) | None => Highlight::Invalid,
        }
    }
}
