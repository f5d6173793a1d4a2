//! Batched simulation of the Chirikov standard map with a queryable run history.
//!
//! ```
//! use stdmap::core::{InitialConditions, StandardMap, WriteMode};
//!
//! # fn main() -> stdmap::error::Result<()> {
//! let mut map = StandardMap::new(0.97, 1000, Some(7))?;
//! map.simulate(WriteMode::Append, InitialConditions::Random(16))?;
//! map.set_k(2.5)?;
//! map.simulate(WriteMode::Append, InitialConditions::from_pairs(&[[0.5, 3.0]]))?;
//! assert_eq!(map.history().len(), 2);
//! assert_eq!(map.run(1)?.n_sim(), 16);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod export;

#[cfg(feature = "python")]
mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The stdmap Python module entry point.
#[cfg(feature = "python")]
#[pymodule]
fn stdmap(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyStandardMap>()?;
    Ok(())
}
