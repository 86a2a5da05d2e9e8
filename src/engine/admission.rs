use std::time::Instant;

use tracing::{debug, warn};

use crate::model::*;
use crate::observability::{ADMISSIONS_TOTAL, ADMISSION_WAIT_SECONDS};

use super::validate::{validate_reservation_range, validate_vehicle_type};
use super::{Engine, EngineError};

impl Engine {
    /// Reserve one `vehicle_type` for `range` if a unit is still free.
    ///
    /// `Ok(false)` is a normal rejection: nothing free, or the type is not in
    /// the catalog. Collaborator errors are returned as-is. The admission lock
    /// is released on every path, and the ledger is untouched unless the
    /// append itself succeeded.
    pub async fn reserve(&self, vehicle_type: &str, range: DateRange) -> Result<bool, EngineError> {
        validate_vehicle_type(vehicle_type)?;
        validate_reservation_range(&range)?;

        let wait_start = Instant::now();
        let _admission = self.admission.lock().await;
        metrics::histogram!(ADMISSION_WAIT_SECONDS).record(wait_start.elapsed().as_secs_f64());

        let result = self.admit_locked(vehicle_type, range).await;
        let outcome = match &result {
            Ok(true) => "admitted",
            Ok(false) => "rejected",
            Err(e) => {
                warn!("admission of {vehicle_type} [{}, {}) failed: {e}", range.start, range.end);
                "error"
            }
        };
        metrics::counter!(ADMISSIONS_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    /// Check-then-commit. Caller holds the admission lock.
    async fn admit_locked(&self, vehicle_type: &str, range: DateRange) -> Result<bool, EngineError> {
        let requested = [vehicle_type.to_string()];
        let free = self.calculate(&range, &requested).await?;
        if free.is_empty() {
            debug!("rejected {vehicle_type} [{}, {}): no capacity", range.start, range.end);
            return Ok(false);
        }

        self.ledger.append(Reservation::new(vehicle_type, range)).await?;
        debug!(
            "admitted {vehicle_type} [{}, {}), {} were free",
            range.start, range.end, free[0].available
        );
        Ok(true)
    }
}
