use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::limits::MAX_RESERVATIONS;
use crate::model::*;

use super::error::StoreError;

/// Source of vehicle types and their fleet sizes.
///
/// Implementations must return types in a stable order; availability rows
/// are emitted in that order.
#[async_trait]
pub trait FleetCatalog: Send + Sync {
    async fn list_vehicle_types(&self) -> Result<Vec<VehicleType>, StoreError>;
}

/// Append-only record of committed reservations.
///
/// `list_reservations` must return a consistent snapshot: either all of a
/// concurrent `append` or none of it.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    async fn list_reservations(&self) -> Result<Vec<Reservation>, StoreError>;

    async fn append(&self, reservation: Reservation) -> Result<(), StoreError>;
}

// ── In-memory implementations ────────────────────────────────

/// Catalog fixed at construction time.
pub struct StaticCatalog {
    types: Vec<VehicleType>,
}

impl StaticCatalog {
    pub fn new(types: Vec<VehicleType>) -> Self {
        Self { types }
    }
}

#[async_trait]
impl FleetCatalog for StaticCatalog {
    async fn list_vehicle_types(&self) -> Result<Vec<VehicleType>, StoreError> {
        Ok(self.types.clone())
    }
}

/// Process-lifetime ledger. Reservations are lost on restart.
pub struct InMemoryLedger {
    reservations: RwLock<Vec<Reservation>>,
    max_len: usize,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_max_len(MAX_RESERVATIONS)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            reservations: RwLock::new(Vec::new()),
            max_len,
        }
    }

    pub async fn len(&self) -> usize {
        self.reservations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ReservationLedger for InMemoryLedger {
    async fn list_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.reservations.read().await.clone())
    }

    async fn append(&self, reservation: Reservation) -> Result<(), StoreError> {
        let mut guard = self.reservations.write().await;
        if guard.len() >= self.max_len {
            return Err(StoreError::Full(self.max_len));
        }
        guard.push(reservation);
        metrics::gauge!(crate::observability::LEDGER_RESERVATIONS).set(guard.len() as f64);
        Ok(())
    }
}
