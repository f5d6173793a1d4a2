use crate::error::{Error, Result};
use ordered_float::OrderedFloat;

/// Default coupling strength.
pub const DEFAULT_K: f64 = 1.0;

/// Default number of iterations (trajectory length, including step 0).
pub const DEFAULT_N_ITERS: usize = 500;

/// Validated standard map parameters.
///
/// - `k`: coupling strength, finite and >= 0
/// - `n_iters`: trajectory length, > 0
/// - `seed`: RNG seed for random initial conditions; `None` for nondeterministic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapParams {
    k: OrderedFloat<f64>,
    n_iters: usize,
    seed: Option<u64>,
}

impl MapParams {
    /// Create a parameter set after validating `k` and `n_iters`.
    ///
    /// Errors:
    /// - `Error::InvalidParameter` if `k` is negative or not finite, or `n_iters` is zero.
    pub fn new(k: f64, n_iters: usize, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            k: validate_k(k)?,
            n_iters: validate_n_iters(n_iters)?,
            seed,
        })
    }

    /// Coupling strength K.
    #[inline]
    pub fn k(&self) -> f64 {
        self.k.into_inner()
    }

    #[inline]
    pub(crate) fn k_ordered(&self) -> OrderedFloat<f64> {
        self.k
    }

    /// Number of iterations.
    #[inline]
    pub fn n_iters(&self) -> usize {
        self.n_iters
    }

    /// RNG seed, if any.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Set K (validated as finite and >= 0).
    pub fn set_k(&mut self, k: f64) -> Result<()> {
        self.k = validate_k(k)?;
        Ok(())
    }

    /// Set the iteration count (validated as > 0).
    pub fn set_n_iters(&mut self, n_iters: usize) -> Result<()> {
        self.n_iters = validate_n_iters(n_iters)?;
        Ok(())
    }

    /// Set or unset the seed. Every value is accepted.
    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }
}

impl Default for MapParams {
    fn default() -> Self {
        Self {
            k: OrderedFloat(DEFAULT_K),
            n_iters: DEFAULT_N_ITERS,
            seed: None,
        }
    }
}

fn validate_k(k: f64) -> Result<OrderedFloat<f64>> {
    if !k.is_finite() || k < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "K must be finite and >= 0, got {k}"
        )));
    }
    Ok(OrderedFloat(k))
}

fn validate_n_iters(n_iters: usize) -> Result<usize> {
    if n_iters == 0 {
        return Err(Error::InvalidParameter("n_iters must be > 0".into()));
    }
    Ok(n_iters)
}
