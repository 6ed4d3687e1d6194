use thiserror::Error;

/// Convenience alias for results produced by storage back-ends.
pub type Result<T> = std::result::Result<T, Error>;

/// The error returned by storage back-ends.
#[derive(Debug, Error)]
#[error("storage error: {kind}")]
pub struct Error {
    kind: ErrorKind,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new storage error wrapping an underlying cause.
    pub fn new<E>(kind: ErrorKind, source: E) -> Error
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error {
            kind,
            source: Some(source.into()),
        }
    }

    /// The category of the failure, used to pick the FTP reply.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { kind, source: None }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
            _ => ErrorKind::LocalError,
        };
        Error::new(kind, err)
    }
}

/// The failure categories a [`Storage`](super::Storage) implementation
/// can report.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum ErrorKind {
    /// The path does not name an existing file or directory.
    #[error("file or directory not found")]
    NotFound,
    /// The operation is not permitted on the target.
    #[error("permission denied")]
    PermissionDenied,
    /// The target already exists.
    #[error("already exists")]
    AlreadyExists,
    /// Any other back-end failure, including short writes.
    #[error("local storage error")]
    LocalError,
}
