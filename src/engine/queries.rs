use crate::model::*;

use super::validate::{validate_query_range, validate_requested_types, validate_vehicle_type};
use super::{Engine, EngineError};

impl Engine {
    /// Free units per vehicle type over `range`. An empty `requested` list
    /// means every type in the catalog.
    ///
    /// Does not take the admission lock: the answer is advisory and may be
    /// stale by the time a concurrent reservation commits.
    pub async fn query_availability(
        &self,
        range: DateRange,
        requested: &[String],
    ) -> Result<Vec<Availability>, EngineError> {
        validate_query_range(&range)?;
        validate_requested_types(requested)?;
        self.calculate(&range, requested).await
    }

    /// Single-type form of `query_availability`. `None` when the type is
    /// unknown or fully booked.
    pub async fn query_type_availability(
        &self,
        range: DateRange,
        vehicle_type: &str,
    ) -> Result<Option<Availability>, EngineError> {
        validate_vehicle_type(vehicle_type)?;
        let requested = [vehicle_type.to_string()];
        let mut rows = self.query_availability(range, &requested).await?;
        Ok(rows.pop())
    }

    pub async fn list_vehicle_types(&self) -> Result<Vec<VehicleType>, EngineError> {
        Ok(self.catalog.list_vehicle_types().await?)
    }

    pub async fn list_reservations(
        &self,
        vehicle_type: Option<&str>,
    ) -> Result<Vec<Reservation>, EngineError> {
        let mut reservations = self.ledger.list_reservations().await?;
        if let Some(vt) = vehicle_type {
            reservations.retain(|r| r.vehicle_type == vt);
        }
        Ok(reservations)
    }
}
