use thiserror::Error;

/// A configured backend name does not match any known backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} backend '{name}' cannot be imported")]
pub struct UnknownBackendError {
    pub kind: &'static str,
    pub name: String,
}
