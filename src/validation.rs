//! Integrity checks for a fetched grid.
//!
//! Detects:
//! - Duplicate IDs within each entity kind
//! - Two allocations claiming the same cell
//! - Allocations without a discipline, or with a repeated professor
//! - Allocations addressed to unknown weekdays or time slots
//! - Allocations referencing unknown disciplines or professors
//! - Malformed or overlapping time slots
//!
//! The first three are *structural*: they break invariants the core relies
//! on. The rest are *referential* and only degrade display; keeping IDs
//! consistent is the data source's job, so they are reported, not enforced.

use std::collections::HashSet;

use crate::models::{ordered_time_slots, GridData};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities of one kind share the same ID.
    DuplicateId,
    /// Two allocations occupy the same cell.
    DuplicateCell,
    /// An allocation has an empty discipline ID.
    MissingDiscipline,
    /// An allocation lists the same professor twice.
    DuplicateProfessor,
    /// An allocation points at a weekday that doesn't exist.
    UnknownWeekday,
    /// An allocation points at a time slot that doesn't exist.
    UnknownTimeSlot,
    /// An allocation references a discipline that doesn't exist.
    UnknownDiscipline,
    /// An allocation references a professor that doesn't exist.
    UnknownProfessor,
    /// A time slot's bounds don't parse or are inverted.
    MalformedTimeSlot,
    /// Two time slots overlap in wall-clock time.
    OverlappingTimeSlots,
}

impl ValidationErrorKind {
    /// Whether this error breaks an invariant the core depends on.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DuplicateId | Self::DuplicateCell | Self::MissingDiscipline | Self::DuplicateProfessor
        )
    }
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether this error breaks an invariant the core depends on.
    pub fn is_structural(&self) -> bool {
        self.kind.is_structural()
    }
}

/// Validates a grid snapshot.
///
/// Checks:
/// 1. No duplicate IDs among weekdays, time slots, disciplines,
///    professors, and allocations
/// 2. At most one allocation per cell
/// 3. Every allocation has a discipline and no repeated professor
/// 4. Allocation cells reference existing weekdays and time slots
/// 5. Discipline and professor references resolve
/// 6. Time slots are well formed and do not overlap
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_grid(grid: &GridData) -> ValidationResult {
    let mut errors = Vec::new();

    let weekday_ids = collect_ids(grid.weekdays.iter().map(|w| w.id.as_str()), "weekday", &mut errors);
    let slot_ids = collect_ids(grid.time_slots.iter().map(|t| t.id.as_str()), "time slot", &mut errors);
    let discipline_ids =
        collect_ids(grid.disciplines.iter().map(|d| d.id.as_str()), "discipline", &mut errors);
    let professor_ids =
        collect_ids(grid.professors.iter().map(|p| p.id.as_str()), "professor", &mut errors);
    collect_ids(grid.allocations.iter().map(|a| a.id.as_str()), "allocation", &mut errors);

    let mut cells = HashSet::new();
    for a in &grid.allocations {
        if !cells.insert(a.cell()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateCell,
                format!("Allocation '{}' shares cell {} with another allocation", a.id, a.cell()),
            ));
        }

        if a.discipline_id.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingDiscipline,
                format!("Allocation '{}' has no discipline", a.id),
            ));
        } else if !discipline_ids.contains(a.discipline_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownDiscipline,
                format!(
                    "Allocation '{}' references unknown discipline '{}'",
                    a.id, a.discipline_id
                ),
            ));
        }

        let mut seen = HashSet::new();
        for p in &a.professor_ids {
            if !seen.insert(p.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateProfessor,
                    format!("Allocation '{}' lists professor '{}' twice", a.id, p),
                ));
            } else if !professor_ids.contains(p.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownProfessor,
                    format!("Allocation '{}' references unknown professor '{}'", a.id, p),
                ));
            }
        }

        if !weekday_ids.contains(a.weekday_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownWeekday,
                format!("Allocation '{}' references unknown weekday '{}'", a.id, a.weekday_id),
            ));
        }
        if !slot_ids.contains(a.time_slot_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownTimeSlot,
                format!(
                    "Allocation '{}' references unknown time slot '{}'",
                    a.id, a.time_slot_id
                ),
            ));
        }
    }

    check_time_slots(grid, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    label: &str,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {label} ID: {id}"),
            ));
        }
    }
    seen
}

/// Adjacent slots in row order must not overlap. Slots are compared in
/// `order` sequence, so a lunch gap between rows is fine.
fn check_time_slots(grid: &GridData, errors: &mut Vec<ValidationError>) {
    let ordered = ordered_time_slots(&grid.time_slots);
    for slot in &ordered {
        if slot.window().is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MalformedTimeSlot,
                format!(
                    "Time slot '{}' has invalid bounds {}",
                    slot.id,
                    slot.label()
                ),
            ));
        }
    }
    for pair in ordered.windows(2) {
        if pair[0].overlaps(pair[1]) {
            errors.push(ValidationError::new(
                ValidationErrorKind::OverlappingTimeSlots,
                format!("Time slots '{}' and '{}' overlap", pair[0].id, pair[1].id),
            ));
        }
    }
}
