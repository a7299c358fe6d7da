use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OpticsError {
    /// Invalid or missing parameters on an element or on the reference.
    #[error("invalid configuration for {context}: {reason}")]
    Configuration { context: String, reason: String },

    /// Particle data that does not come in rows of 6 coordinates.
    #[error("expected rows of {expected} coordinates, found {found} values")]
    Shape { expected: usize, found: usize },
}

impl OpticsError {
    pub(crate) fn config<C: Into<String>, R: Into<String>>(context: C, reason: R) -> OpticsError {
        OpticsError::Configuration {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OpticsError>;
