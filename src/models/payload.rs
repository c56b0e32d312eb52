//! Drag payloads and drop events.
//!
//! The payload is a closed variant: adding a new draggable kind forces
//! every `match` in the compatibility engine and the reconciler to take
//! a position on it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Allocation, CellId, Discipline, Professor};

/// Kind of a drag payload, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadKind {
    /// A discipline from the palette.
    Discipline,
    /// A professor from the palette.
    Professor,
    /// An allocation picked up from a cell.
    Allocation,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discipline => "discipline",
            Self::Professor => "professor",
            Self::Allocation => "allocation",
        };
        f.write_str(name)
    }
}

/// Data carried by a drag gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum DragPayload {
    /// A discipline dragged from the palette (copied onto the grid).
    Discipline(Discipline),
    /// A professor dragged from the palette (copied onto the grid).
    Professor(Professor),
    /// An allocation dragged out of a cell (moved).
    Allocation {
        /// Snapshot of the dragged allocation.
        allocation: Allocation,
        /// Cell the drag started from.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<CellId>,
    },
}

impl DragPayload {
    /// Picks up the allocation sitting in its own cell.
    pub fn pick_up(allocation: Allocation) -> Self {
        let source = Some(allocation.cell());
        Self::Allocation { allocation, source }
    }

    /// Payload kind.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Discipline(_) => PayloadKind::Discipline,
            Self::Professor(_) => PayloadKind::Professor,
            Self::Allocation { .. } => PayloadKind::Allocation,
        }
    }

    /// Cell the payload was dragged out of, if any.
    pub fn source_cell(&self) -> Option<&CellId> {
        match self {
            Self::Allocation { source, .. } => source.as_ref(),
            Self::Discipline(_) | Self::Professor(_) => None,
        }
    }
}

impl From<Discipline> for DragPayload {
    fn from(discipline: Discipline) -> Self {
        Self::Discipline(discipline)
    }
}

impl From<Professor> for DragPayload {
    fn from(professor: Professor) -> Self {
        Self::Professor(professor)
    }
}

/// What a drop does to its payload's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropEffect {
    /// The payload leaves its source.
    Move,
    /// The payload is duplicated; the source keeps it.
    Copy,
    /// The drop is not allowed.
    None,
}

/// A completed drop gesture, forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropEvent {
    /// What was dropped.
    pub payload: DragPayload,
    /// Cell it was dropped on.
    pub target: CellId,
}

impl DropEvent {
    /// Creates a drop event.
    pub fn new(payload: impl Into<DragPayload>, target: CellId) -> Self {
        Self {
            payload: payload.into(),
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_source() {
        let d: DragPayload = Discipline::new("1", "MATH101").into();
        assert_eq!(d.kind(), PayloadKind::Discipline);
        assert!(d.source_cell().is_none());

        let a = Allocation::new("a1", "1", &CellId::new("1", "2"));
        let moved = DragPayload::pick_up(a);
        assert_eq!(moved.kind(), PayloadKind::Allocation);
        assert_eq!(moved.source_cell(), Some(&CellId::new("1", "2")));
        assert_eq!(PayloadKind::Professor.to_string(), "professor");
    }

    #[test]
    fn test_payload_tagging() {
        let p: DragPayload = Professor::new("1", "Dr. John Smith").into();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "professor");
        assert_eq!(json["data"]["name"], "Dr. John Smith");

        let back: DragPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_unknown_kind_does_not_parse() {
        let json = r#"{"type":"room","data":{"id":"r1"}}"#;
        assert!(serde_json::from_str::<DragPayload>(json).is_err());
    }
}
