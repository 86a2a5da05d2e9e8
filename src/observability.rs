use std::net::SocketAddr;

use crate::sql::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total statements executed. Labels: command, status.
pub const QUERIES_TOTAL: &str = "fleetbook_queries_total";

/// Histogram: statement latency in seconds. Labels: command.
pub const QUERY_DURATION_SECONDS: &str = "fleetbook_query_duration_seconds";

/// Counter: reservation attempts. Labels: outcome (admitted, rejected, error).
pub const ADMISSIONS_TOTAL: &str = "fleetbook_admissions_total";

/// Histogram: time spent waiting for the admission lock, in seconds.
pub const ADMISSION_WAIT_SECONDS: &str = "fleetbook_admission_wait_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: reservations held by the in-memory ledger.
pub const LEDGER_RESERVATIONS: &str = "fleetbook_ledger_reservations";

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "fleetbook_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "fleetbook_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "fleetbook_connections_rejected_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::SelectAvailability { .. } => "select_availability",
        Command::InsertReservation { .. } => "insert_reservation",
        Command::SelectVehicleTypes => "select_vehicle_types",
        Command::SelectReservations { .. } => "select_reservations",
    }
}
