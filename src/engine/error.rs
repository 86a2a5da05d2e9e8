use crate::model::Ms;

/// Failure raised by a catalog or ledger implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backing storage could not be reached.
    Unavailable(String),
    /// Ledger refused the append because it is at capacity.
    Full(usize),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            StoreError::Full(cap) => write!(f, "ledger full: {cap} reservations"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    InvalidRange { start: Ms, end: Ms },
    InvalidVehicleType(String),
    LimitExceeded(&'static str),
    Store(StoreError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidRange { start, end } => {
                write!(f, "invalid date range [{start}, {end}): start must be before end")
            }
            EngineError::InvalidVehicleType(name) => {
                write!(f, "invalid vehicle type: {name:?}")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e)
    }
}
