//! Drop planning.

use tracing::debug;

use super::{Mutation, NoopReason, Reconciliation};
use crate::models::{
    Allocation, AllocationRequest, AllocationSet, CellId, Discipline, DragPayload, DropEvent,
    Professor,
};

/// Plans the mutations for a drop against the current allocation set.
///
/// Compatibility is not re-checked here beyond the professor guard; callers
/// filter illegal drops through the compatibility engine first.
pub fn reconcile(current: &AllocationSet, drop: &DropEvent) -> Reconciliation {
    let plan = match &drop.payload {
        DragPayload::Discipline(discipline) => place_discipline(current, discipline, &drop.target),
        DragPayload::Professor(professor) => assign_professor(current, professor, &drop.target),
        DragPayload::Allocation { allocation, source } => {
            move_allocation(current, allocation, source.as_ref(), &drop.target)
        }
    };
    debug!(
        kind = %drop.payload.kind(),
        cell = %drop.target,
        mutations = plan.mutations().len(),
        "planned drop"
    );
    plan
}

fn place_discipline(current: &AllocationSet, discipline: &Discipline, target: &CellId) -> Reconciliation {
    match current.get(target) {
        Some(existing) if existing.discipline_id == discipline.id => {
            Reconciliation::Unchanged(NoopReason::SameDiscipline)
        }
        Some(existing) => Reconciliation::Apply(vec![Mutation::Update {
            id: existing.id.clone(),
            request: AllocationRequest::at(target)
                .with_discipline(discipline.id.clone())
                .expecting(existing.version),
        }]),
        None => Reconciliation::Apply(vec![Mutation::Create(
            AllocationRequest::at(target)
                .with_discipline(discipline.id.clone())
                .with_professors(Vec::new()),
        )]),
    }
}

fn assign_professor(current: &AllocationSet, professor: &Professor, target: &CellId) -> Reconciliation {
    let Some(existing) = current.get(target).filter(|a| !a.discipline_id.is_empty()) else {
        return Reconciliation::Unchanged(NoopReason::MissingDiscipline);
    };
    if existing.has_professor(&professor.id) {
        return Reconciliation::Unchanged(NoopReason::AlreadyAssigned);
    }

    let mut professor_ids = existing.professor_ids.clone();
    professor_ids.push(professor.id.clone());
    Reconciliation::Apply(vec![Mutation::Update {
        id: existing.id.clone(),
        request: AllocationRequest::at(target)
            .with_discipline(existing.discipline_id.clone())
            .with_professors(professor_ids)
            .expecting(existing.version),
    }])
}

fn move_allocation(
    current: &AllocationSet,
    dragged: &Allocation,
    source: Option<&CellId>,
    target: &CellId,
) -> Reconciliation {
    let origin = source.cloned().unwrap_or_else(|| dragged.cell());
    if &origin == target {
        return Reconciliation::Unchanged(NoopReason::SameCell);
    }

    // plan against the held record, not the snapshot taken at drag start
    let Some(moving) = current.find(&dragged.id) else {
        return Reconciliation::NotFound {
            allocation_id: dragged.id.clone(),
        };
    };
    if moving.is_at(target) {
        return Reconciliation::Unchanged(NoopReason::SameCell);
    }

    let mut mutations = Vec::with_capacity(2);
    if let Some(occupant) = current.get(target) {
        mutations.push(Mutation::Delete {
            id: occupant.id.clone(),
            expected_version: occupant.version,
        });
    }
    mutations.push(Mutation::Update {
        id: moving.id.clone(),
        request: AllocationRequest::at(target)
            .with_discipline(moving.discipline_id.clone())
            .with_professors(moving.professor_ids.clone())
            .expecting(moving.version),
    });
    Reconciliation::Apply(mutations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AllocationState;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn cell(w: &str, t: &str) -> CellId {
        CellId::new(w, t)
    }

    fn math() -> Discipline {
        Discipline::new("1", "MATH101").with_name("Mathematics")
    }

    fn apply(set: &AllocationSet, drop: DropEvent) -> AllocationSet {
        reconcile(set, &drop).preview(set)
    }

    #[test]
    fn test_discipline_on_empty_creates() {
        let set = AllocationSet::new();
        let plan = reconcile(&set, &DropEvent::new(math(), cell("1", "1")));
        match plan.mutations() {
            [Mutation::Create(req)] => {
                assert_eq!(req.discipline_id.as_deref(), Some("1"));
                assert_eq!(req.professor_ids.as_deref(), Some(&[][..]));
                assert_eq!(req.cell(), cell("1", "1"));
            }
            other => panic!("unexpected plan: {other:?}"),
        }

        let next = plan.preview(&set);
        let a = next.at("1", "1").unwrap();
        assert_eq!(a.discipline_id, "1");
        assert!(a.professor_ids.is_empty());
        assert_eq!(next.state_at(&cell("1", "1")), AllocationState::DisciplineOnly);
    }

    #[test]
    fn test_discipline_replacement_keeps_professors() {
        let mut set = AllocationSet::new();
        set.insert(
            Allocation::new("a1", "1", &cell("1", "1"))
                .with_professors(["1", "2"])
                .with_version(4),
        );

        let physics = Discipline::new("2", "PHYS101");
        let plan = reconcile(&set, &DropEvent::new(physics, cell("1", "1")));
        match plan.mutations() {
            [Mutation::Update { id, request }] => {
                assert_eq!(id, "a1");
                assert_eq!(request.expected_version, Some(4));
                assert!(request.professor_ids.is_none());
            }
            other => panic!("unexpected plan: {other:?}"),
        }

        let next = plan.preview(&set);
        let a = next.at("1", "1").unwrap();
        assert_eq!(a.discipline_id, "2");
        assert_eq!(a.professor_ids, ["1", "2"]);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn test_same_discipline_is_noop() {
        let mut set = AllocationSet::new();
        set.insert(Allocation::new("a1", "1", &cell("1", "1")));
        let plan = reconcile(&set, &DropEvent::new(math(), cell("1", "1")));
        assert_eq!(plan, Reconciliation::Unchanged(NoopReason::SameDiscipline));
    }

    #[test]
    fn test_professor_on_empty_is_noop() {
        let set = AllocationSet::new();
        let plan = reconcile(&set, &DropEvent::new(Professor::new("2", "Johnson"), cell("1", "2")));
        assert_eq!(plan, Reconciliation::Unchanged(NoopReason::MissingDiscipline));
        assert_eq!(plan.preview(&set), set);
    }

    #[test]
    fn test_professor_without_discipline_is_noop() {
        let mut set = AllocationSet::new();
        set.insert(Allocation::new("a1", "", &cell("1", "1")));
        let plan = reconcile(&set, &DropEvent::new(Professor::new("1", "Smith"), cell("1", "1")));
        assert_eq!(plan, Reconciliation::Unchanged(NoopReason::MissingDiscipline));
    }

    #[test]
    fn test_professor_drop_is_idempotent() {
        let set = apply(&AllocationSet::new(), DropEvent::new(math(), cell("1", "1")));
        let smith = Professor::new("1", "Smith");

        let once = apply(&set, DropEvent::new(smith.clone(), cell("1", "1")));
        assert_eq!(once.at("1", "1").unwrap().professor_ids, ["1"]);

        let plan = reconcile(&once, &DropEvent::new(smith, cell("1", "1")));
        assert_eq!(plan, Reconciliation::Unchanged(NoopReason::AlreadyAssigned));
        assert_eq!(plan.preview(&once).at("1", "1").unwrap().professor_ids.len(), 1);
    }

    #[test]
    fn test_professors_accumulate() {
        let mut set = apply(&AllocationSet::new(), DropEvent::new(math(), cell("1", "1")));
        for id in ["1", "2", "3"] {
            set = apply(&set, DropEvent::new(Professor::new(id, id), cell("1", "1")));
        }
        assert_eq!(set.at("1", "1").unwrap().professor_ids, ["1", "2", "3"]);
    }

    #[test]
    fn test_move_to_same_cell_is_noop() {
        let mut set = AllocationSet::new();
        let a = Allocation::new("a1", "1", &cell("1", "1"));
        set.insert(a.clone());
        let plan = reconcile(&set, &DropEvent::new(DragPayload::pick_up(a), cell("1", "1")));
        assert_eq!(plan, Reconciliation::Unchanged(NoopReason::SameCell));
    }

    #[test]
    fn test_move_to_empty_rekeys() {
        let mut set = AllocationSet::new();
        let a = Allocation::new("a1", "1", &cell("1", "1")).with_professors(["1"]);
        set.insert(a.clone());

        let plan = reconcile(&set, &DropEvent::new(DragPayload::pick_up(a), cell("2", "1")));
        assert!(matches!(plan.mutations(), [Mutation::Update { .. }]));

        let next = plan.preview(&set);
        assert_eq!(next.len(), 1);
        assert_eq!(next.state_at(&cell("1", "1")), AllocationState::Empty);
        let moved = next.at("2", "1").unwrap();
        assert_eq!(moved.id, "a1");
        assert_eq!(moved.professor_ids, ["1"]);
    }

    #[test]
    fn test_move_onto_occupied_evicts_target() {
        let mut set = AllocationSet::new();
        let a = Allocation::new("a", "1", &cell("1", "1")).with_professors(["1"]);
        let b = Allocation::new("b", "2", &cell("2", "1")).with_version(7);
        set.insert(a.clone());
        set.insert(b);

        let plan = reconcile(&set, &DropEvent::new(DragPayload::pick_up(a), cell("2", "1")));
        match plan.mutations() {
            [Mutation::Delete { id, expected_version }, Mutation::Update { id: moved, .. }] => {
                assert_eq!(id, "b");
                assert_eq!(*expected_version, 7);
                assert_eq!(moved, "a");
            }
            other => panic!("unexpected plan: {other:?}"),
        }

        let next = plan.preview(&set);
        assert_eq!(next.len(), 1);
        assert!(next.find("b").is_none());
        let target = next.at("2", "1").unwrap();
        assert_eq!(target.id, "a");
        assert_eq!(target.discipline_id, "1");
        assert_eq!(target.professor_ids, ["1"]);
    }

    #[test]
    fn test_move_of_vanished_allocation_is_not_found() {
        let set = AllocationSet::new();
        let ghost = Allocation::new("ghost", "1", &cell("1", "1"));
        let plan = reconcile(&set, &DropEvent::new(DragPayload::pick_up(ghost), cell("2", "2")));
        assert_eq!(
            plan,
            Reconciliation::NotFound {
                allocation_id: "ghost".into()
            }
        );
        assert!(plan.is_noop());
    }

    #[test]
    fn test_move_uses_held_record() {
        let mut set = AllocationSet::new();
        let snapshot = Allocation::new("a", "1", &cell("1", "1"));
        set.insert(snapshot.clone().with_professors(["4"]).with_version(2));

        let next = apply(&set, DropEvent::new(DragPayload::pick_up(snapshot), cell("3", "3")));
        let moved = next.at("3", "3").unwrap();
        assert_eq!(moved.professor_ids, ["4"]);
        assert_eq!(moved.version, 3);
    }

    #[test]
    fn test_documented_walkthrough() {
        let empty = AllocationSet::new();

        let s1 = apply(&empty, DropEvent::new(math(), cell("1", "1")));
        let a = s1.at("1", "1").unwrap();
        assert_eq!((a.discipline_id.as_str(), a.professor_ids.len()), ("1", 0));
        assert_eq!(s1.state_at(&cell("1", "1")), AllocationState::DisciplineOnly);

        let s2 = apply(&s1, DropEvent::new(Professor::new("1", "Smith"), cell("1", "1")));
        assert_eq!(s2.at("1", "1").unwrap().professor_ids, ["1"]);
        assert_eq!(s2.state_at(&cell("1", "1")), AllocationState::DisciplineWithProfessors);

        let s3 = apply(&s2, DropEvent::new(Professor::new("2", "Johnson"), cell("1", "2")));
        assert_eq!(s3, s2);
        assert_eq!(s3.state_at(&cell("1", "2")), AllocationState::Empty);

        let held = s3.at("1", "1").unwrap().clone();
        let s4 = apply(&s3, DropEvent::new(DragPayload::pick_up(held), cell("2", "1")));
        assert!(s4.at("2", "1").is_some());
        assert_eq!(s4.state_at(&cell("1", "1")), AllocationState::Empty);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Discipline { discipline: u8, weekday: u8, slot: u8 },
        Professor { professor: u8, weekday: u8, slot: u8 },
        Move { from: (u8, u8), to: (u8, u8) },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..3, 0u8..3, 0u8..3).prop_map(|(discipline, weekday, slot)| Op::Discipline {
                discipline,
                weekday,
                slot
            }),
            (0u8..3, 0u8..3, 0u8..3).prop_map(|(professor, weekday, slot)| Op::Professor {
                professor,
                weekday,
                slot
            }),
            ((0u8..3, 0u8..3), (0u8..3, 0u8..3)).prop_map(|(from, to)| Op::Move { from, to }),
        ]
    }

    fn to_drop(set: &AllocationSet, op: &Op) -> Option<DropEvent> {
        let at = |(w, t): (u8, u8)| cell(&w.to_string(), &t.to_string());
        match op {
            Op::Discipline { discipline, weekday, slot } => Some(DropEvent::new(
                Discipline::new(discipline.to_string(), format!("D{discipline}")),
                at((*weekday, *slot)),
            )),
            Op::Professor { professor, weekday, slot } => Some(DropEvent::new(
                Professor::new(professor.to_string(), format!("P{professor}")),
                at((*weekday, *slot)),
            )),
            Op::Move { from, to } => set
                .get(&at(*from))
                .map(|a| DropEvent::new(DragPayload::pick_up(a.clone()), at(*to))),
        }
    }

    fn assert_well_formed(set: &AllocationSet) -> Result<(), TestCaseError> {
        let mut ids = HashSet::new();
        for a in set {
            prop_assert!(ids.insert(a.id.clone()), "duplicate id {}", a.id);
            prop_assert_eq!(set.get(&a.cell()).map(|held| held.id.as_str()), Some(a.id.as_str()));
            prop_assert!(!a.discipline_id.is_empty());
            let unique: HashSet<&String> = a.professor_ids.iter().collect();
            prop_assert_eq!(unique.len(), a.professor_ids.len());
        }
        prop_assert!(set.len() <= 9);
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_every_drop_keeps_the_grid_well_formed(ops in proptest::collection::vec(op(), 0..40)) {
            let mut set = AllocationSet::new();
            for op in &ops {
                let Some(drop) = to_drop(&set, op) else { continue };
                let before = set.clone();
                let target_state = before.state_at(&drop.target);
                set = reconcile(&before, &drop).preview(&before);
                assert_well_formed(&set)?;

                match &drop.payload {
                    DragPayload::Professor(_) if target_state == AllocationState::Empty => {
                        prop_assert_eq!(&set, &before);
                    }
                    DragPayload::Allocation { allocation, source } => {
                        if source.as_ref() == Some(&drop.target) {
                            prop_assert_eq!(&set, &before);
                        } else {
                            let evicted = usize::from(target_state.is_occupied());
                            prop_assert_eq!(set.len(), before.len() - evicted);
                            prop_assert_eq!(
                                set.get(&drop.target).map(|a| a.id.as_str()),
                                Some(allocation.id.as_str())
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}
