use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    NotFound(String),
    /// Unique value already taken (email on registration or profile update).
    Duplicate(String),
    /// Row still referenced by sales history.
    Conflict(String),
    Invalid(String),
    InsufficientStock(String),
    EmptyCart,
    Sqlite(String),
    Io(String),
}

impl StoreError {
    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(msg)
            | Self::Duplicate(msg)
            | Self::Conflict(msg)
            | Self::Invalid(msg)
            | Self::InsufficientStock(msg) => write!(f, "{msg}"),
            Self::EmptyCart => write!(f, "cart is empty"),
            Self::Sqlite(msg) => write!(f, "sqlite error: {msg}"),
            Self::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}
