//! Drop compatibility engine.
//!
//! Decides whether a drag payload may land on a cell, and what the drop
//! does to the payload's origin. Both decisions are pure functions of the
//! cell's [`AllocationState`] and the payload; they run once per candidate
//! cell per drag-over event.
//!
//! # Rules
//!
//! | Payload | `Empty` | `DisciplineOnly` | `DisciplineWithProfessors` |
//! |---------|---------|------------------|----------------------------|
//! | Discipline | yes | yes | yes |
//! | Professor | no | yes | yes |
//! | Allocation | yes | yes | yes |
//!
//! Compatibility and effect are decided separately from the mutation:
//! a discipline dropped on an occupied cell is legal here, and the
//! reconciler decides that it replaces the discipline and keeps the
//! professors.

use std::fmt::Debug;

use crate::models::{AllocationState, DragPayload, DropEffect, PayloadKind};

/// A drop rule set consulted by the board and by cell trackers.
pub trait DropPolicy: Send + Sync + Debug {
    /// Policy name.
    fn name(&self) -> &'static str;

    /// Whether a payload of `kind` may land on a cell in `state`.
    fn accepts(&self, state: AllocationState, kind: PayloadKind) -> bool;

    /// Whether `payload` may land on a cell in `state`.
    fn can_drop(&self, state: AllocationState, payload: &DragPayload) -> bool {
        self.accepts(state, payload.kind())
    }

    /// Effect of dropping `payload` on a cell in `state`.
    ///
    /// `None` when the drop is not allowed; `Move` for an allocation that
    /// knows its source cell; `Copy` otherwise.
    fn drop_effect(&self, state: AllocationState, payload: &DragPayload) -> DropEffect {
        if !self.can_drop(state, payload) {
            return DropEffect::None;
        }
        match payload {
            DragPayload::Allocation {
                source: Some(_), ..
            } => DropEffect::Move,
            DragPayload::Allocation { source: None, .. }
            | DragPayload::Discipline(_)
            | DragPayload::Professor(_) => DropEffect::Copy,
        }
    }
}

/// The timetable's drop rules (see module docs).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPolicy;

impl DropPolicy for StandardPolicy {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn accepts(&self, state: AllocationState, kind: PayloadKind) -> bool {
        can_drop_kind(state, kind)
    }
}

/// Standard rule keyed by payload kind.
pub fn can_drop_kind(state: AllocationState, kind: PayloadKind) -> bool {
    match kind {
        PayloadKind::Discipline | PayloadKind::Allocation => true,
        // a professor never occupies a cell without a discipline
        PayloadKind::Professor => state.is_occupied(),
    }
}

/// Standard rule for a concrete payload.
pub fn can_drop(state: AllocationState, payload: &DragPayload) -> bool {
    StandardPolicy.can_drop(state, payload)
}

/// Standard drop effect for a concrete payload.
pub fn drop_effect(state: AllocationState, payload: &DragPayload) -> DropEffect {
    StandardPolicy.drop_effect(state, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Allocation, CellId, Discipline, Professor};

    const STATES: [AllocationState; 3] = [
        AllocationState::Empty,
        AllocationState::DisciplineOnly,
        AllocationState::DisciplineWithProfessors,
    ];

    fn discipline() -> DragPayload {
        Discipline::new("1", "MATH101").into()
    }

    fn professor() -> DragPayload {
        Professor::new("1", "Dr. John Smith").into()
    }

    fn moved() -> DragPayload {
        DragPayload::pick_up(Allocation::new("a1", "1", &CellId::new("1", "1")))
    }

    #[test]
    fn test_discipline_lands_anywhere() {
        for state in STATES {
            assert!(can_drop(state, &discipline()), "{state:?}");
            assert_eq!(drop_effect(state, &discipline()), DropEffect::Copy);
        }
    }

    #[test]
    fn test_professor_needs_discipline() {
        assert!(!can_drop(AllocationState::Empty, &professor()));
        assert_eq!(drop_effect(AllocationState::Empty, &professor()), DropEffect::None);

        assert!(can_drop(AllocationState::DisciplineOnly, &professor()));
        assert!(can_drop(AllocationState::DisciplineWithProfessors, &professor()));
        assert_eq!(
            drop_effect(AllocationState::DisciplineOnly, &professor()),
            DropEffect::Copy
        );
    }

    #[test]
    fn test_allocation_moves_anywhere() {
        for state in STATES {
            assert!(can_drop(state, &moved()));
            assert_eq!(drop_effect(state, &moved()), DropEffect::Move);
        }
    }

    #[test]
    fn test_allocation_without_source_copies() {
        let orphan = DragPayload::Allocation {
            allocation: Allocation::new("a1", "1", &CellId::new("1", "1")),
            source: None,
        };
        assert_eq!(drop_effect(AllocationState::Empty, &orphan), DropEffect::Copy);
    }

    #[test]
    fn test_decisions_are_repeatable() {
        for state in STATES {
            for payload in [discipline(), professor(), moved()] {
                let first = (can_drop(state, &payload), drop_effect(state, &payload));
                let second = (can_drop(state, &payload), drop_effect(state, &payload));
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_policy_name() {
        assert_eq!(StandardPolicy.name(), "standard");
    }
}
