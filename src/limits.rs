use crate::model::Ms;

const DAY_MS: Ms = 86_400_000;

/// 1970-01-01. Negative instants are rejected.
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// 2200-01-01.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 7_258_118_400_000;

/// Longest single reservation: one year.
pub const MAX_RESERVATION_SPAN_MS: Ms = 366 * DAY_MS;
/// Widest availability query: ten years.
pub const MAX_QUERY_WINDOW_MS: Ms = 10 * 366 * DAY_MS;

pub const MAX_VEHICLE_TYPE_LEN: usize = 128;
pub const MAX_VEHICLE_TYPES: usize = 1_000;
pub const MAX_REQUESTED_TYPES: usize = 1_000;

/// Hard cap on the in-memory ledger.
pub const MAX_RESERVATIONS: usize = 1_000_000;

/// Bind parameters per statement; the wire protocol counts them in an i16.
pub const MAX_BIND_PARAMS: usize = 65_535;
