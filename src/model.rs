use serde::{Deserialize, Serialize};

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Half-open pickup/return interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Ms,
    pub end: Ms,
}

impl DateRange {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "DateRange start must be before end");
        Self { start, end }
    }

    /// Like `new`, but returns `None` for empty or inverted ranges.
    pub fn checked(start: Ms, end: Ms) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Touching ranges (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// A class of vehicle in the fleet and how many units of it exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleType {
    pub name: String,
    pub total_count: u32,
}

impl VehicleType {
    pub fn new(name: impl Into<String>, total_count: u32) -> Self {
        Self {
            name: name.into(),
            total_count,
        }
    }
}

/// A committed booking of one vehicle of `vehicle_type` for `range`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub vehicle_type: String,
    pub range: DateRange,
}

impl Reservation {
    pub fn new(vehicle_type: impl Into<String>, range: DateRange) -> Self {
        Self {
            vehicle_type: vehicle_type.into(),
            range,
        }
    }
}

// ── Query result types ───────────────────────────────────────────

/// Free units of one vehicle type over a queried range. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub vehicle_type: String,
    pub available: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Ms = 86_400_000;
    // 2024-09-01T00:00:00Z
    const SEP_1: Ms = 1_725_148_800_000;

    fn sep(day: i64) -> Ms {
        SEP_1 + (day - 1) * DAY
    }

    #[test]
    fn range_basics() {
        let r = DateRange::new(100, 200);
        assert_eq!(r.duration_ms(), 100);
        assert!(r.contains_instant(100));
        assert!(r.contains_instant(199));
        assert!(!r.contains_instant(200)); // half-open
    }

    #[test]
    fn checked_rejects_empty_and_inverted() {
        assert_eq!(DateRange::checked(1, 2), Some(DateRange::new(1, 2)));
        assert!(DateRange::checked(5, 5).is_none());
        assert!(DateRange::checked(6, 5).is_none());
    }

    #[test]
    fn overlapping_ranges() {
        let a = DateRange::new(sep(1), sep(10));
        let b = DateRange::new(sep(5), sep(15));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn disjoint_ranges() {
        let a = DateRange::new(sep(1), sep(10));
        let c = DateRange::new(sep(11), sep(20));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = DateRange::new(sep(1), sep(10));
        let d = DateRange::new(sep(10), sep(15));
        assert!(!a.overlaps(&d));
        assert!(!d.overlaps(&a));
    }

    #[test]
    fn contained_range_overlaps() {
        let a = DateRange::new(sep(1), sep(30));
        let e = DateRange::new(sep(10), sep(20));
        assert!(a.overlaps(&e));
        assert!(e.overlaps(&a));
    }

    #[test]
    fn single_ms_overlap() {
        let a = DateRange::new(100, 201);
        let b = DateRange::new(200, 300);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn vehicle_type_deserializes_from_config_shape() {
        let vt: VehicleType =
            serde_json::from_str(r#"{"name":"Compact","total_count":3}"#).unwrap();
        assert_eq!(vt, VehicleType::new("Compact", 3));
    }
}
