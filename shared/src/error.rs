use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitcherError {
    #[error("failed to persist layer choice: {0}")]
    Storage(String),
    #[error("map library interop failed: {0}")]
    Interop(String),
}

pub type Result<T> = std::result::Result<T, SwitcherError>;
