mod admission;
mod availability;
mod error;
mod queries;
mod store;
mod validate;

pub use availability::availability;
pub use error::{EngineError, StoreError};
pub use store::{FleetCatalog, InMemoryLedger, ReservationLedger, StaticCatalog};
pub use validate::checked_range;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::model::*;

/// Availability queries and reservation admission over an injected fleet
/// catalog and reservation ledger.
///
/// Queries read the collaborators directly. Admissions go through a single
/// engine-wide mutex so that the capacity check and the ledger append are
/// atomic with respect to every other admission. Bookings for unrelated
/// vehicle types still queue behind each other; per-type locking would lift
/// that ceiling without weakening the no-overbooking guarantee.
pub struct Engine {
    catalog: Arc<dyn FleetCatalog>,
    ledger: Arc<dyn ReservationLedger>,
    admission: Mutex<()>,
}

impl Engine {
    pub fn new(catalog: Arc<dyn FleetCatalog>, ledger: Arc<dyn ReservationLedger>) -> Self {
        Self {
            catalog,
            ledger,
            admission: Mutex::new(()),
        }
    }

    /// Static catalog + process-lifetime ledger.
    pub fn in_memory(fleet: Vec<VehicleType>) -> Self {
        Self::new(
            Arc::new(StaticCatalog::new(fleet)),
            Arc::new(InMemoryLedger::new()),
        )
    }

    /// Read one catalog listing and one ledger snapshot and run the calculator.
    /// Input is assumed validated.
    pub(super) async fn calculate(
        &self,
        range: &DateRange,
        requested: &[String],
    ) -> Result<Vec<Availability>, EngineError> {
        let fleet = self.catalog.list_vehicle_types().await?;
        let reservations = self.ledger.list_reservations().await?;
        Ok(availability(&fleet, &reservations, range, requested))
    }
}
