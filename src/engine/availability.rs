use std::collections::{HashMap, HashSet};

use crate::model::*;

// ── Availability Algorithm ────────────────────────────────────────

/// Compute free units per vehicle type over `query`.
///
/// `requested` filters the catalog by exact name; an empty slice means every
/// type. Unknown names produce no row. A reservation counts against its type
/// when its range overlaps `query` at all, so the count is conservative for
/// long queries covering several back-to-back bookings.
///
/// Rows follow catalog order. Types with nothing free are omitted, never
/// reported as zero.
pub fn availability(
    catalog: &[VehicleType],
    reservations: &[Reservation],
    query: &DateRange,
    requested: &[String],
) -> Vec<Availability> {
    let wanted: Option<HashSet<&str>> =
        (!requested.is_empty()).then(|| requested.iter().map(String::as_str).collect());
    let candidates: Vec<&VehicleType> = catalog
        .iter()
        .filter(|vt| wanted.as_ref().is_none_or(|w| w.contains(vt.name.as_str())))
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    let reserved = reserved_counts(reservations, query, &candidates);

    candidates
        .into_iter()
        .filter_map(|vt| {
            let taken = reserved.get(vt.name.as_str()).copied().unwrap_or(0);
            let free = i64::from(vt.total_count) - taken as i64;
            (free > 0).then(|| Availability {
                vehicle_type: vt.name.clone(),
                available: free as u32,
            })
        })
        .collect()
}

/// Single pass over the ledger: overlapping reservations per candidate type.
fn reserved_counts<'a>(
    reservations: &[Reservation],
    query: &DateRange,
    candidates: &[&'a VehicleType],
) -> HashMap<&'a str, usize> {
    let mut counts: HashMap<&'a str, usize> =
        candidates.iter().map(|vt| (vt.name.as_str(), 0)).collect();
    for r in reservations {
        if !r.range.overlaps(query) {
            continue;
        }
        if let Some(n) = counts.get_mut(r.vehicle_type.as_str()) {
            *n += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: Ms = 86_400_000;

    fn range(start_day: i64, end_day: i64) -> DateRange {
        DateRange::new(start_day * D, end_day * D)
    }

    fn fleet() -> Vec<VehicleType> {
        vec![
            VehicleType::new("Compact", 3),
            VehicleType::new("Sedan", 2),
            VehicleType::new("SUV", 1),
            VehicleType::new("Van", 1),
        ]
    }

    fn booked(vehicle_type: &str, start_day: i64, end_day: i64) -> Reservation {
        Reservation::new(vehicle_type, range(start_day, end_day))
    }

    fn all() -> Vec<String> {
        Vec::new()
    }

    fn only(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn subtracts_overlapping_reservations() {
        let catalog = vec![VehicleType::new("Compact", 5)];
        let reservations = vec![booked("Compact", 1, 5), booked("Compact", 3, 8)];
        let rows = availability(&catalog, &reservations, &range(2, 6), &all());
        assert_eq!(
            rows,
            vec![Availability {
                vehicle_type: "Compact".into(),
                available: 3
            }]
        );
    }

    #[test]
    fn ignores_non_overlapping_and_touching() {
        let catalog = vec![VehicleType::new("Compact", 2)];
        let reservations = vec![
            booked("Compact", 1, 5),  // ends where the query starts
            booked("Compact", 10, 12), // starts where the query ends
            booked("Compact", 20, 30),
        ];
        let rows = availability(&catalog, &reservations, &range(5, 10), &all());
        assert_eq!(rows[0].available, 2);
    }

    #[test]
    fn other_types_do_not_count() {
        let reservations = vec![booked("Sedan", 1, 5), booked("Sedan", 1, 5)];
        let rows = availability(&fleet(), &reservations, &range(2, 3), &only(&["Compact"]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].available, 3);
    }

    #[test]
    fn fully_booked_type_is_omitted() {
        let reservations = vec![booked("SUV", 1, 5), booked("Sedan", 1, 5), booked("Sedan", 2, 4)];
        let rows = availability(&fleet(), &reservations, &range(2, 3), &all());
        let names: Vec<&str> = rows.iter().map(|r| r.vehicle_type.as_str()).collect();
        assert_eq!(names, vec!["Compact", "Van"]);
        assert!(rows.iter().all(|r| r.available > 0));
    }

    #[test]
    fn overbooked_type_is_omitted_not_negative() {
        let catalog = vec![VehicleType::new("Van", 1)];
        let reservations = vec![booked("Van", 1, 5), booked("Van", 1, 5), booked("Van", 1, 5)];
        let rows = availability(&catalog, &reservations, &range(1, 5), &all());
        assert!(rows.is_empty());
    }

    #[test]
    fn zero_fleet_type_is_omitted() {
        let catalog = vec![VehicleType::new("Limo", 0), VehicleType::new("Van", 1)];
        let rows = availability(&catalog, &[], &range(1, 2), &all());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vehicle_type, "Van");
    }

    #[test]
    fn empty_request_means_all_types_in_catalog_order() {
        let rows = availability(&fleet(), &[], &range(1, 2), &all());
        assert_eq!(
            rows,
            vec![
                Availability { vehicle_type: "Compact".into(), available: 3 },
                Availability { vehicle_type: "Sedan".into(), available: 2 },
                Availability { vehicle_type: "SUV".into(), available: 1 },
                Availability { vehicle_type: "Van".into(), available: 1 },
            ]
        );
    }

    #[test]
    fn requested_subset_keeps_catalog_order() {
        let rows = availability(&fleet(), &[], &range(1, 2), &only(&["Van", "Compact"]));
        let names: Vec<&str> = rows.iter().map(|r| r.vehicle_type.as_str()).collect();
        assert_eq!(names, vec!["Compact", "Van"]);
    }

    #[test]
    fn unknown_requested_type_yields_no_row() {
        let rows = availability(&fleet(), &[], &range(1, 2), &only(&["Hovercraft"]));
        assert!(rows.is_empty());

        let rows = availability(&fleet(), &[], &range(1, 2), &only(&["Hovercraft", "SUV"]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vehicle_type, "SUV");
    }

    #[test]
    fn name_match_is_exact() {
        let rows = availability(&fleet(), &[], &range(1, 2), &only(&["suv", "SUV "]));
        assert!(rows.is_empty());
    }

    #[test]
    fn long_query_counts_every_overlapping_reservation() {
        // Two back-to-back bookings never coexist, but both overlap the query.
        let catalog = vec![VehicleType::new("Sedan", 2)];
        let reservations = vec![booked("Sedan", 1, 5), booked("Sedan", 5, 9)];
        let rows = availability(&catalog, &reservations, &range(0, 10), &all());
        assert!(rows.is_empty());
    }

    #[test]
    fn empty_catalog() {
        let rows = availability(&[], &[booked("Van", 1, 2)], &range(1, 2), &all());
        assert!(rows.is_empty());
    }

    #[test]
    fn reservations_count_only_against_exact_type() {
        let catalog = vec![VehicleType::new("SUV", 2), VehicleType::new("Van", 1)];
        let reservations = vec![booked("suv", 1, 5), booked("Van", 1, 5)];
        let rows = availability(&catalog, &reservations, &range(2, 3), &all());
        assert_eq!(
            rows,
            vec![Availability {
                vehicle_type: "SUV".into(),
                available: 2,
            }]
        );
    }
}
