use thiserror::Error;

/// Failures raised by cell, network and schedule operations.
///
/// All of them point at a programming or configuration defect; none is
/// transient. Apart from `Io`/`Json`, the checks that produce them only run
/// with the `strict` feature enabled.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid unit index {index}: {reason}")]
    InvalidIndex { index: usize, reason: &'static str },

    #[error("index {index} is outside a buffer of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("structural mismatch in {what}: expected length {expected}, found {found}")]
    StructuralMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("activation function '{0}' is not registered")]
    ActivationNotFound(String),

    #[error("dependency cycle: {unscheduled} unit(s) can never be scheduled")]
    CyclicDependency { unscheduled: usize },

    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("batch size must be at least 1")]
    EmptyBatch,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Whether invariant checks are compiled in.
pub(crate) const STRICT: bool = cfg!(feature = "strict");

pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::StructuralMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

pub(crate) fn check_in_range(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::IndexOutOfRange { index, len });
    }
    Ok(())
}
