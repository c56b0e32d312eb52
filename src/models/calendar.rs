//! Weekly calendar axes: weekdays, time slots, and the cells they span.
//!
//! # Time Model
//! Time slots carry wall-clock strings (`"HH:MM"`). A slot covers the
//! half-open interval `[start, end)`: it includes its start minute and
//! excludes its end minute, so back-to-back slots never overlap.
//!
//! # Ordering
//! Both axes are ordered by their `order` field, not by id or by time.
//! The grid is laid out weekday-major: columns are weekdays, rows are slots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A day column of the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weekday {
    /// Unique weekday identifier.
    pub id: String,
    /// Full name (e.g., "Monday").
    pub name: String,
    /// Abbreviated name (e.g., "Mon").
    pub short_name: String,
    /// Column position (ascending).
    pub order: u32,
}

impl Weekday {
    /// Creates a weekday.
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: u32) -> Self {
        let name = name.into();
        let short_name = name.chars().take(3).collect();
        Self {
            id: id.into(),
            name,
            short_name,
            order,
        }
    }
}

/// A row of the weekly grid: one lesson period, repeated on every weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    /// Unique time slot identifier.
    pub id: String,
    /// Start time, `"HH:MM"` (inclusive).
    pub start_time: String,
    /// End time, `"HH:MM"` (exclusive).
    pub end_time: String,
    /// Row position (ascending).
    pub order: u32,
}

impl TimeSlot {
    /// Creates a time slot.
    pub fn new(
        id: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            order,
        }
    }

    /// Slot bounds in minutes since midnight, `[start, end)`.
    ///
    /// Returns `None` if either bound is malformed or the slot is empty.
    pub fn window(&self) -> Option<(u32, u32)> {
        let start = parse_clock(&self.start_time)?;
        let end = parse_clock(&self.end_time)?;
        (end > start).then_some((start, end))
    }

    /// Slot length in minutes, if the bounds are well formed.
    pub fn duration_minutes(&self) -> Option<u32> {
        self.window().map(|(start, end)| end - start)
    }

    /// Whether two slots overlap in wall-clock time.
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self.window(), other.window()) {
            (Some((a_start, a_end)), Some((b_start, b_end))) => a_start < b_end && b_start < a_end,
            _ => false,
        }
    }

    /// Display label, e.g. `"08:00 - 09:00"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.start_time, self.end_time)
    }
}

/// Address of one grid cell: a (weekday, time slot) pair.
///
/// Displays as `"<weekday_id>-<time_slot_id>"`, the form used to tag the
/// originating cell of a dragged allocation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellId {
    /// Weekday (column) identifier.
    pub weekday_id: String,
    /// Time slot (row) identifier.
    pub time_slot_id: String,
}

impl CellId {
    /// Creates a cell address.
    pub fn new(weekday_id: impl Into<String>, time_slot_id: impl Into<String>) -> Self {
        Self {
            weekday_id: weekday_id.into(),
            time_slot_id: time_slot_id.into(),
        }
    }

    /// Whether this cell lies at the given coordinates.
    #[inline]
    pub fn is_at(&self, weekday_id: &str, time_slot_id: &str) -> bool {
        self.weekday_id == weekday_id && self.time_slot_id == time_slot_id
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.weekday_id, self.time_slot_id)
    }
}

/// Parses `"HH:MM"` into minutes since midnight.
pub fn parse_clock(value: &str) -> Option<u32> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Returns weekdays sorted by `order` (stable for equal orders).
pub fn ordered_weekdays(weekdays: &[Weekday]) -> Vec<&Weekday> {
    let mut sorted: Vec<&Weekday> = weekdays.iter().collect();
    sorted.sort_by_key(|w| w.order);
    sorted
}

/// Returns time slots sorted by `order` (stable for equal orders).
pub fn ordered_time_slots(time_slots: &[TimeSlot]) -> Vec<&TimeSlot> {
    let mut sorted: Vec<&TimeSlot> = time_slots.iter().collect();
    sorted.sort_by_key(|t| t.order);
    sorted
}
