use std::backtrace::Backtrace;
use std::fmt::{Debug, Display, Formatter};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    ConfigurationError = 1,
    ConnectionError = 2,
    ExecutionError = 3,
    UnknownDriver = 4,

    UnknownError = -1,
}

pub struct Error {
    kind: ErrorKind,
    inner: Box<dyn std::error::Error + Send + Sync>,
    backtrace: Backtrace,
}

impl Error {
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error {
            kind,
            inner: error.into(),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn missing_database_url() -> Self {
        Self::new(
            ErrorKind::ConfigurationError,
            "DATABASE_URL is not set and no --database-url was given",
        )
    }

    pub fn invalid_dsn<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::ConfigurationError, error)
    }

    pub fn not_connected() -> Self {
        Self::new(ErrorKind::ConnectionError, "Connection not established")
    }

    pub fn connection<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::ConnectionError, error)
    }

    pub fn unknown_driver<T>(scheme: T) -> Self
    where
        T: ToString,
    {
        Self::new(
            ErrorKind::UnknownDriver,
            format!("Unknown or unsupported scheme \"{}\"", scheme.to_string()),
        )
    }

    pub fn execution<I, E>(identifier: I, error: E) -> Self
    where
        I: Display,
        E: Display,
    {
        Self::new(
            ErrorKind::ExecutionError,
            format!("migration {identifier} failed: {error}"),
        )
    }

    pub fn rollback<I, E>(identifier: I, error: E) -> Self
    where
        I: Display,
        E: Display,
    {
        Self::new(
            ErrorKind::ExecutionError,
            format!("rollback of {identifier} failed: {error}"),
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\nBacktrace:\n{}", self.inner, self.backtrace)
    }
}

impl<T> From<T> for Error
where
    T: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn from(err: T) -> Self {
        crate::error::Error::new(ErrorKind::UnknownError, err)
    }
}
