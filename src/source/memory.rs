//! In-process data source.
//!
//! Holds one [`GridData`] behind a shared lock. Clones share the same store,
//! so two boards built from clones of one source see each other's writes;
//! that is how the concurrency paths are exercised without a server.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::DataSource;
use crate::error::SourceError;
use crate::models::{
    Allocation, AllocationRequest, CellId, Discipline, GridData, Professor, TimeSlot, Weekday,
};

/// In-memory source configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySourceConfig {
    /// Simulated round-trip delay applied to every call.
    pub latency: Duration,
    /// Seed for allocation ID generation.
    pub seed: u64,
}

impl Default for MemorySourceConfig {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            seed: 42,
        }
    }
}

impl MemorySourceConfig {
    /// Creates a configuration with no latency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the simulated latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the ID seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug)]
struct Store {
    grid: GridData,
    rng: SmallRng,
    offline: bool,
}

impl Store {
    fn ensure_online(&self) -> Result<(), SourceError> {
        if self.offline {
            return Err(SourceError::unavailable("in-memory source is offline"));
        }
        Ok(())
    }

    fn next_id(&mut self) -> String {
        loop {
            let id = format!("{:016x}", self.rng.random::<u64>());
            if !self.grid.allocations.iter().any(|a| a.id == id) {
                return id;
            }
        }
    }

    fn position(&self, id: &str) -> Result<usize, SourceError> {
        self.grid
            .allocations
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| SourceError::not_found(id))
    }

    /// Any allocation other than `except` holding `cell`.
    fn occupant(&self, cell: &CellId, except: Option<&str>) -> Option<&Allocation> {
        self.grid
            .allocations
            .iter()
            .find(|a| a.is_at(cell) && Some(a.id.as_str()) != except)
    }

    fn check_version(stored: &Allocation, expected: Option<u64>) -> Result<(), SourceError> {
        match expected {
            Some(expected) if expected != stored.version => Err(SourceError::StaleVersion {
                id: stored.id.clone(),
                expected,
                actual: stored.version,
            }),
            _ => Ok(()),
        }
    }
}

/// A [`DataSource`] backed by shared in-process state.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    config: MemorySourceConfig,
    store: Arc<Mutex<Store>>,
}

impl InMemorySource {
    /// Creates a source serving `grid`.
    pub fn new(config: MemorySourceConfig, grid: GridData) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        Self {
            config,
            store: Arc::new(Mutex::new(Store {
                grid,
                rng,
                offline: false,
            })),
        }
    }

    /// Creates a source serving [`demo_grid`] with default configuration.
    pub fn demo() -> Self {
        Self::new(MemorySourceConfig::default(), demo_grid())
    }

    /// Current configuration.
    pub fn config(&self) -> &MemorySourceConfig {
        &self.config
    }

    /// Makes every subsequent call fail with [`SourceError::Unavailable`]
    /// (or succeed again when `false`).
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Copy of the stored grid, bypassing latency and the offline switch.
    pub fn snapshot(&self) -> GridData {
        self.lock().grid.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn round_trip(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

impl DataSource for InMemorySource {
    async fn fetch_grid(&self) -> Result<GridData, SourceError> {
        self.round_trip().await;
        let store = self.lock();
        store.ensure_online()?;
        debug!(
            allocations = store.grid.allocations.len(),
            "in-memory grid fetched"
        );
        Ok(store.grid.clone())
    }

    async fn create_allocation(&self, request: AllocationRequest) -> Result<Allocation, SourceError> {
        self.round_trip().await;
        let mut store = self.lock();
        store.ensure_online()?;

        let discipline_id = request
            .discipline_id
            .clone()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| SourceError::invalid_request("allocation requires a discipline"))?;
        let cell = request.cell();
        if let Some(occupant) = store.occupant(&cell, None) {
            return Err(SourceError::CellOccupied {
                cell,
                occupant: occupant.id.clone(),
            });
        }

        let id = store.next_id();
        let record = Allocation::new(id, discipline_id, &cell)
            .with_professors(request.professor_ids.unwrap_or_default())
            .with_version(1);
        store.grid.allocations.push(record.clone());
        info!(id = %record.id, cell = %cell, "allocation created");
        Ok(record)
    }

    async fn update_allocation(
        &self,
        id: &str,
        request: AllocationRequest,
    ) -> Result<Allocation, SourceError> {
        self.round_trip().await;
        let mut store = self.lock();
        store.ensure_online()?;

        let index = store.position(id)?;
        let stored = &store.grid.allocations[index];
        Store::check_version(stored, request.expected_version)?;

        let cell = request.cell();
        if let Some(occupant) = store.occupant(&cell, Some(id)) {
            return Err(SourceError::CellOccupied {
                cell,
                occupant: occupant.id.clone(),
            });
        }

        let updated = stored.updated_with(&request);
        store.grid.allocations[index] = updated.clone();
        info!(id, cell = %cell, version = updated.version, "allocation updated");
        Ok(updated)
    }

    async fn delete_allocation(&self, id: &str, expected_version: Option<u64>) -> Result<(), SourceError> {
        self.round_trip().await;
        let mut store = self.lock();
        store.ensure_online()?;

        let index = store.position(id)?;
        Store::check_version(&store.grid.allocations[index], expected_version)?;
        store.grid.allocations.remove(index);
        info!(id, "allocation deleted");
        Ok(())
    }
}

/// Reference data of the stock timetable: a Monday to Friday week with
/// four morning periods and two afternoon periods, four disciplines and
/// their professors. No allocations.
pub fn demo_grid() -> GridData {
    let weekdays = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
        .into_iter()
        .zip(1u32..)
        .map(|(name, order)| Weekday::new(order.to_string(), name, order));

    let time_slots = [
        ("08:00", "09:00"),
        ("09:00", "10:00"),
        ("10:00", "11:00"),
        ("11:00", "12:00"),
        ("14:00", "15:00"),
        ("15:00", "16:00"),
    ]
    .into_iter()
    .zip(1u32..)
    .map(|((start, end), order)| TimeSlot::new(order.to_string(), start, end, order));

    let disciplines = [
        ("1", "Mathematics", "MATH101", "#3B82F6"),
        ("2", "Physics", "PHYS101", "#EF4444"),
        ("3", "Chemistry", "CHEM101", "#10B981"),
        ("4", "Biology", "BIO101", "#F59E0B"),
    ]
    .into_iter()
    .map(|(id, name, code, color)| {
        Discipline::new(id, code)
            .with_name(name)
            .with_color(color)
            .with_duration(60)
    });

    let professors = [
        ("1", "Dr. John Smith", "j.smith@university.edu", "Mathematics"),
        ("2", "Prof. Sarah Johnson", "s.johnson@university.edu", "Physics"),
        ("3", "Dr. Michael Brown", "m.brown@university.edu", "Chemistry"),
        ("4", "Prof. Emily Davis", "e.davis@university.edu", "Biology"),
    ]
    .into_iter()
    .map(|(id, name, email, department)| {
        Professor::new(id, name)
            .with_email(email)
            .with_department(department)
    });

    GridData {
        weekdays: weekdays.collect(),
        time_slots: time_slots.collect(),
        disciplines: disciplines.collect(),
        professors: professors.collect(),
        allocations: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_grid;

    fn cell(w: &str, t: &str) -> CellId {
        CellId::new(w, t)
    }

    fn math_at(w: &str, t: &str) -> AllocationRequest {
        AllocationRequest::at(&cell(w, t)).with_discipline("1")
    }

    #[test]
    fn test_demo_grid_shape() {
        let grid = demo_grid();
        assert_eq!(grid.weekdays.len(), 5);
        assert_eq!(grid.weekdays[0].short_name, "Mon");
        assert_eq!(grid.time_slots.len(), 6);
        assert_eq!(grid.time_slots[4].start_time, "14:00");
        assert_eq!(grid.cell_count(), 30);
        assert_eq!(grid.discipline("2").unwrap().code, "PHYS101");
        assert_eq!(grid.professor("4").unwrap().department, "Biology");
        assert!(grid.allocations.is_empty());
        assert!(validate_grid(&grid).is_ok());
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_version() {
        let source = InMemorySource::demo();
        let a = source.create_allocation(math_at("1", "1")).await.unwrap();
        let b = source.create_allocation(math_at("1", "2")).await.unwrap();

        assert_eq!(a.version, 1);
        assert_eq!(a.id.len(), 16);
        assert_ne!(a.id, b.id);
        assert!(a.professor_ids.is_empty());
        assert_eq!(source.snapshot().allocations.len(), 2);
    }

    #[tokio::test]
    async fn test_ids_follow_seed() {
        let config = MemorySourceConfig::new().with_seed(7);
        let first = InMemorySource::new(config.clone(), demo_grid());
        let second = InMemorySource::new(config, demo_grid());

        let a = first.create_allocation(math_at("1", "1")).await.unwrap();
        let b = second.create_allocation(math_at("1", "1")).await.unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_create_rejects_occupied_cell_and_blank_discipline() {
        let source = InMemorySource::demo();
        let a = source.create_allocation(math_at("1", "1")).await.unwrap();

        let err = source.create_allocation(math_at("1", "1")).await.unwrap_err();
        assert_eq!(
            err,
            SourceError::CellOccupied {
                cell: cell("1", "1"),
                occupant: a.id,
            }
        );

        let err = source
            .create_allocation(AllocationRequest::at(&cell("2", "2")))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_update_merges_and_bumps_version() {
        let source = InMemorySource::demo();
        let a = source.create_allocation(math_at("1", "1")).await.unwrap();

        let with_prof = source
            .update_allocation(
                &a.id,
                AllocationRequest::at(&cell("1", "1"))
                    .with_professors(vec!["1".into()])
                    .expecting(1),
            )
            .await
            .unwrap();
        assert_eq!(with_prof.version, 2);
        assert_eq!(with_prof.discipline_id, "1");
        assert_eq!(with_prof.professor_ids, ["1"]);

        let moved = source
            .update_allocation(&a.id, AllocationRequest::at(&cell("3", "5")))
            .await
            .unwrap();
        assert_eq!(moved.cell(), cell("3", "5"));
        assert_eq!(moved.professor_ids, ["1"]);
        assert_eq!(moved.version, 3);
    }

    #[tokio::test]
    async fn test_update_guards() {
        let source = InMemorySource::demo();
        let a = source.create_allocation(math_at("1", "1")).await.unwrap();
        let b = source.create_allocation(math_at("2", "1")).await.unwrap();

        let err = source
            .update_allocation(&a.id, AllocationRequest::at(&cell("1", "1")).expecting(9))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SourceError::StaleVersion {
                id: a.id.clone(),
                expected: 9,
                actual: 1,
            }
        );

        let err = source
            .update_allocation(&a.id, AllocationRequest::at(&cell("2", "1")))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SourceError::CellOccupied {
                cell: cell("2", "1"),
                occupant: b.id,
            }
        );

        let err = source
            .update_allocation("missing", AllocationRequest::at(&cell("1", "1")))
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::not_found("missing"));
    }

    #[tokio::test]
    async fn test_delete() {
        let source = InMemorySource::demo();
        let a = source.create_allocation(math_at("1", "1")).await.unwrap();

        let err = source.delete_allocation(&a.id, Some(4)).await.unwrap_err();
        assert!(matches!(err, SourceError::StaleVersion { .. }));

        source.delete_allocation(&a.id, Some(1)).await.unwrap();
        assert!(source.snapshot().allocations.is_empty());

        let err = source.delete_allocation(&a.id, None).await.unwrap_err();
        assert_eq!(err, SourceError::not_found(a.id));
    }

    #[tokio::test]
    async fn test_offline_switch_and_shared_clones() {
        let source = InMemorySource::demo();
        let other = source.clone();

        other.set_offline(true);
        let err = source.fetch_grid().await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
        assert!(source.create_allocation(math_at("1", "1")).await.is_err());

        other.set_offline(false);
        other.create_allocation(math_at("1", "1")).await.unwrap();
        assert_eq!(source.fetch_grid().await.unwrap().allocations.len(), 1);
    }

    #[tokio::test]
    async fn test_latency_is_applied() {
        let config = MemorySourceConfig::new().with_latency(Duration::from_millis(5));
        let source = InMemorySource::new(config, demo_grid());
        let started = std::time::Instant::now();
        source.fetch_grid().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(5));
    }
}
