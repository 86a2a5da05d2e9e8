use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::limits::{MAX_VEHICLE_TYPE_LEN, MAX_VEHICLE_TYPES};
use crate::model::VehicleType;

pub const DEFAULT_PORT: &str = "5434";
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_MAX_CONNECTIONS: usize = 256;

/// Server settings, read once at startup from `FLEETBOOK_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    pub port: String,
    pub max_connections: usize,
    pub metrics_port: Option<u16>,
    pub fleet: Vec<VehicleType>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Fleet precedence:
    /// `FLEETBOOK_FLEET_FILE`, then `FLEETBOOK_FLEET`, then the built-in fleet.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("FLEETBOOK_PORT").unwrap_or_else(|| DEFAULT_PORT.into());
        let bind = lookup("FLEETBOOK_BIND").unwrap_or_else(|| DEFAULT_BIND.into());
        let max_connections = match lookup("FLEETBOOK_MAX_CONNECTIONS") {
            Some(s) => match s.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::BadValue("FLEETBOOK_MAX_CONNECTIONS", s)),
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let metrics_port = match lookup("FLEETBOOK_METRICS_PORT") {
            Some(s) => Some(
                s.parse()
                    .map_err(|_| ConfigError::BadValue("FLEETBOOK_METRICS_PORT", s))?,
            ),
            None => None,
        };

        let fleet = if let Some(path) = lookup("FLEETBOOK_FLEET_FILE") {
            load_fleet_file(Path::new(&path))?
        } else if let Some(inline) = lookup("FLEETBOOK_FLEET") {
            parse_fleet(&inline)?
        } else {
            default_fleet()
        };
        validate_fleet(&fleet)?;

        Ok(Self {
            bind,
            port,
            max_connections,
            metrics_port,
            fleet,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// The fleet the service ships with when nothing is configured.
pub fn default_fleet() -> Vec<VehicleType> {
    vec![
        VehicleType::new("Compact", 3),
        VehicleType::new("Sedan", 2),
        VehicleType::new("SUV", 1),
        VehicleType::new("Van", 1),
    ]
}

/// Parse `Name=Count,Name=Count`. Blank entries are skipped.
pub fn parse_fleet(spec: &str) -> Result<Vec<VehicleType>, ConfigError> {
    let mut fleet = Vec::new();
    for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, count) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::BadFleetEntry(entry.to_string()))?;
        let total_count = count
            .trim()
            .parse()
            .map_err(|_| ConfigError::BadFleetEntry(entry.to_string()))?;
        fleet.push(VehicleType::new(name.trim(), total_count));
    }
    Ok(fleet)
}

/// Load a JSON array of `{"name": ..., "total_count": ...}` objects.
pub fn load_fleet_file(path: &Path) -> Result<Vec<VehicleType>, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| ConfigError::Json(path.to_path_buf(), e.to_string()))
}

pub fn validate_fleet(fleet: &[VehicleType]) -> Result<(), ConfigError> {
    if fleet.is_empty() {
        return Err(ConfigError::EmptyFleet);
    }
    if fleet.len() > MAX_VEHICLE_TYPES {
        return Err(ConfigError::TooManyTypes(fleet.len()));
    }
    let mut seen = HashSet::new();
    for vt in fleet {
        if vt.name.trim().is_empty() || vt.name.len() > MAX_VEHICLE_TYPE_LEN {
            return Err(ConfigError::BadTypeName(vt.name.clone()));
        }
        if !seen.insert(vt.name.as_str()) {
            return Err(ConfigError::DuplicateType(vt.name.clone()));
        }
    }
    Ok(())
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    BadValue(&'static str, String),
    BadFleetEntry(String),
    BadTypeName(String),
    DuplicateType(String),
    EmptyFleet,
    TooManyTypes(usize),
    Io(PathBuf, String),
    Json(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::BadValue(var, v) => write!(f, "{var}: invalid value {v:?}"),
            ConfigError::BadFleetEntry(e) => {
                write!(f, "fleet entry {e:?}: expected Name=Count")
            }
            ConfigError::BadTypeName(n) => write!(f, "invalid vehicle type name: {n:?}"),
            ConfigError::DuplicateType(n) => write!(f, "duplicate vehicle type: {n}"),
            ConfigError::EmptyFleet => write!(f, "fleet has no vehicle types"),
            ConfigError::TooManyTypes(n) => {
                write!(f, "fleet has {n} vehicle types (max {MAX_VEHICLE_TYPES})")
            }
            ConfigError::Io(p, e) => write!(f, "reading {}: {e}", p.display()),
            ConfigError::Json(p, e) => write!(f, "parsing {}: {e}", p.display()),
        }
    }
}

impl std::error::Error for ConfigError {}
