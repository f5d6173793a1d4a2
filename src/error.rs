use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the standard map engine, its run history and the CSV export.
///
/// Every validation failure is reported before any state is mutated, so an
/// `Err` from the engine always leaves the run history exactly as it was.
#[derive(Debug, Error)]
pub enum Error {
    /// Coupling strength or iteration count outside its allowed domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed or out-of-bounds initial conditions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unrecognized argument, e.g. a write mode other than append/overwrite.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Run index or selector value outside the valid bounds.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Propagated I/O errors from CSV export.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Propagated CSV writer errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
