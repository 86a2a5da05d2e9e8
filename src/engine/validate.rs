use crate::limits::*;
use crate::model::*;

use super::EngineError;

/// Build a range from raw endpoints, rejecting `end <= start`.
pub fn checked_range(start: Ms, end: Ms) -> Result<DateRange, EngineError> {
    DateRange::checked(start, end).ok_or(EngineError::InvalidRange { start, end })
}

fn validate_bounds(range: &DateRange) -> Result<(), EngineError> {
    if range.start >= range.end {
        return Err(EngineError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    if range.start < MIN_VALID_TIMESTAMP_MS || range.end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    Ok(())
}

pub(crate) fn validate_reservation_range(range: &DateRange) -> Result<(), EngineError> {
    validate_bounds(range)?;
    if range.duration_ms() > MAX_RESERVATION_SPAN_MS {
        return Err(EngineError::LimitExceeded("reservation too long"));
    }
    Ok(())
}

pub(crate) fn validate_query_range(range: &DateRange) -> Result<(), EngineError> {
    validate_bounds(range)?;
    if range.duration_ms() > MAX_QUERY_WINDOW_MS {
        return Err(EngineError::LimitExceeded("query window too wide"));
    }
    Ok(())
}

pub(crate) fn validate_vehicle_type(name: &str) -> Result<(), EngineError> {
    if name.trim().is_empty() {
        return Err(EngineError::InvalidVehicleType(name.to_string()));
    }
    if name.len() > MAX_VEHICLE_TYPE_LEN {
        return Err(EngineError::LimitExceeded("vehicle type name too long"));
    }
    Ok(())
}

pub(crate) fn validate_requested_types(requested: &[String]) -> Result<(), EngineError> {
    if requested.len() > MAX_REQUESTED_TYPES {
        return Err(EngineError::LimitExceeded("too many requested vehicle types"));
    }
    Ok(())
}
