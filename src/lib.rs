//! Weekly timetable grid core.
//!
//! A timetable is a grid of weekdays × time slots. Each cell holds at most
//! one allocation: a discipline plus zero or more professors. Users edit it
//! by dragging disciplines and professors from palettes onto cells, or by
//! dragging an allocation from one cell to another. This crate decides which
//! drops are legal, turns each drop into data-source mutations, and keeps
//! the per-cell state consistent with what the data source confirmed.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Discipline`, `Professor`, `Weekday`,
//!   `TimeSlot`, `CellId`, `Allocation`, `AllocationSet`, `DragPayload`
//! - **`compatibility`**: Drop rules (`can_drop`, `drop_effect`, `DropPolicy`)
//! - **`reconciler`**: Drop → mutation planning (`reconcile`)
//! - **`projection`**: Per-cell display state, drop targets, occupancy
//! - **`session`**: Drag lifecycle broadcast and per-cell hover tracking
//! - **`source`**: `DataSource` trait and an in-memory implementation
//! - **`board`**: `ScheduleBoard`, the drop pipeline over a data source
//! - **`validation`**: Integrity checks on a fetched grid
//!
//! # Cell States
//!
//! | State | Accepts discipline | Accepts professor | Accepts allocation |
//! |-------|--------------------|-------------------|--------------------|
//! | `Empty` | yes | no | yes |
//! | `DisciplineOnly` | yes | yes | yes |
//! | `DisciplineWithProfessors` | yes | yes | yes |
//!
//! # Architecture
//!
//! Compatibility, reconciliation and projection are pure functions over an
//! [`AllocationSet`](models::AllocationSet). The board is the only place
//! that awaits the data source, and it serializes mutations through
//! `&mut self`.

pub mod board;
pub mod compatibility;
pub mod error;
pub mod models;
pub mod projection;
pub mod reconciler;
pub mod session;
pub mod source;
pub mod validation;

pub use board::{BoardConfig, DropOutcome, ScheduleBoard};
pub use compatibility::{can_drop, drop_effect, DropPolicy, StandardPolicy};
pub use error::{BoardError, Result, SourceError};
pub use reconciler::{reconcile, Reconciliation};
pub use source::{DataSource, InMemorySource};
