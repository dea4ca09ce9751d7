// ---------------------------------------------------------------------------
// PersistenceError: error types for snapshot save/load
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while saving or restoring a vessel snapshot.
#[derive(Debug)]
pub enum PersistenceError {
    /// I/O error (file not found, permission denied, disk full, etc.)
    Io(std::io::Error),
    /// The snapshot is not valid JSON or doesn't match the snapshot layout.
    Json(serde_json::Error),
    /// Snapshot format version is newer than this build supports.
    VersionMismatch { expected_max: u32, found: u32 },
    /// The vessel handle does not resolve in this world.
    MissingVessel,
    /// The snapshot refers to a room or structure the vessel doesn't have.
    Mismatch { kind: &'static str, index: usize, available: usize },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "I/O error: {e}"),
            PersistenceError::Json(e) => write!(f, "Snapshot JSON error: {e}"),
            PersistenceError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: snapshot is v{found}, but this build only supports up to v{expected_max}"
            ),
            PersistenceError::MissingVessel => write!(f, "Vessel not found in world"),
            PersistenceError::Mismatch {
                kind,
                index,
                available,
            } => write!(f, "Snapshot names {kind} #{index}, but the vessel only has {available}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(e) => Some(e),
            PersistenceError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        PersistenceError::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_error_display_io() {
        let err = PersistenceError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        let msg = format!("{err}");
        assert!(msg.contains("I/O error"), "got: {msg}");
        assert!(msg.contains("file not found"), "got: {msg}");
    }

    #[test]
    fn test_persistence_error_display_version_mismatch() {
        let err = PersistenceError::VersionMismatch {
            expected_max: 1,
            found: 7,
        };
        let msg = format!("{err}");
        assert!(msg.contains("v7"), "got: {msg}");
        assert!(msg.contains("v1"), "got: {msg}");
    }

    #[test]
    fn test_persistence_error_display_mismatch() {
        let err = PersistenceError::Mismatch {
            kind: "room",
            index: 4,
            available: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains("room #4"), "got: {msg}");
    }

    #[test]
    fn test_persistence_error_from_json() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: PersistenceError = json_err.into();
        assert!(matches!(err, PersistenceError::Json(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
