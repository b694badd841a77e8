use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the install pipeline.
/// Every module returns `Result<T, InstallerError>`.
#[derive(Debug, Error)]
pub enum InstallerError {
    // ── Archive ─────────────────────────────────────────
    #[error("Not a valid archive {path:?}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("Extraction failed at {path:?}: {source}")]
    Extraction {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Archive {0:?} has no single top-level directory")]
    AmbiguousArchiveLayout(PathBuf),

    // ── Descriptor ──────────────────────────────────────
    #[error("Malformed {file}: {reason}")]
    MalformedDescriptor { file: String, reason: String },

    // ── Registry ────────────────────────────────────────
    #[error("A mod named '{0}' is already installed")]
    DuplicateName(String),

    #[error("A mod with id '{0}' is already installed")]
    DuplicateId(String),

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Instance ────────────────────────────────────────
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Instance already exists: {0}")]
    InstanceAlreadyExists(String),

    // ── Tasks ───────────────────────────────────────────
    #[error("Background task '{label}' failed: {reason}")]
    TaskFailed { label: String, reason: String },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type InstallerResult<T> = Result<T, InstallerError>;

/// Coarse classification handed to callers alongside a failed install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Archive,
    Extraction,
    AmbiguousArchiveLayout,
    MalformedDescriptor,
    DuplicateName,
    DuplicateId,
    Io,
    Internal,
}

impl InstallerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InstallerError::Archive { .. } => ErrorKind::Archive,
            InstallerError::Extraction { .. } => ErrorKind::Extraction,
            InstallerError::AmbiguousArchiveLayout(_) => ErrorKind::AmbiguousArchiveLayout,
            InstallerError::MalformedDescriptor { .. } => ErrorKind::MalformedDescriptor,
            InstallerError::DuplicateName(_) => ErrorKind::DuplicateName,
            InstallerError::DuplicateId(_) => ErrorKind::DuplicateId,
            InstallerError::Io { .. } | InstallerError::Json(_) => ErrorKind::Io,
            InstallerError::InstanceNotFound(_)
            | InstallerError::InstanceAlreadyExists(_)
            | InstallerError::TaskFailed { .. }
            | InstallerError::Other(_) => ErrorKind::Internal,
        }
    }

    /// True for the two registry conflict errors.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            InstallerError::DuplicateName(_) | InstallerError::DuplicateId(_)
        )
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        InstallerError::Archive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn extraction(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallerError::Extraction {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallerError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for InstallerError {
    fn from(source: std::io::Error) -> Self {
        InstallerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for host IPC ──────────────────────────
// Frontends receive the error as its display string.
impl serde::Serialize for InstallerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_errors_are_classified() {
        let err = InstallerError::DuplicateId("m1".into());
        assert!(err.is_conflict());
        assert_eq!(err.kind(), ErrorKind::DuplicateId);

        let err = InstallerError::AmbiguousArchiveLayout(PathBuf::from("flat.zip"));
        assert!(!err.is_conflict());
        assert_eq!(err.kind(), ErrorKind::AmbiguousArchiveLayout);
    }

    #[test]
    fn errors_serialize_as_display_string() {
        let err = InstallerError::DuplicateName("terrain-pack".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"A mod named 'terrain-pack' is already installed\"");
    }
}
