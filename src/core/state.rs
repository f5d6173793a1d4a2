use crate::error::{Error, Result};
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::TAU;

/// Index of the action variable `I` on the component axis.
pub const ACTION: usize = 0;

/// Index of the angle variable `theta` on the component axis.
pub const ANGLE: usize = 1;

/// Initial conditions for a batch of trajectories.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialConditions {
    /// `n` trajectories with (I, theta) drawn uniformly from [0, 2π) × [0, 2π).
    Random(usize),
    /// Explicit (m, 2) batch of (I, theta) pairs, every entry in [0, 2π].
    Batch(Array2<f64>),
}

impl InitialConditions {
    /// Build an explicit batch from (I, theta) pairs.
    pub fn from_pairs(pairs: &[[f64; 2]]) -> Self {
        let batch = Array2::from_shape_fn((pairs.len(), 2), |(i, c)| pairs[i][c]);
        InitialConditions::Batch(batch)
    }

    /// Check the variant's invariants without allocating any state.
    ///
    /// Errors:
    /// - `Error::InvalidInput` for an empty batch, a second dimension other than 2,
    ///   or any coordinate that is not finite or lies outside [0, 2π].
    pub fn validate(&self) -> Result<()> {
        match self {
            InitialConditions::Random(n) => {
                if *n == 0 {
                    return Err(Error::InvalidInput(
                        "number of random trajectories must be > 0".into(),
                    ));
                }
            }
            InitialConditions::Batch(batch) => {
                let (m, cols) = batch.dim();
                if cols != 2 {
                    return Err(Error::InvalidInput(format!(
                        "initial conditions must have shape (m, 2), got ({m}, {cols})"
                    )));
                }
                if m == 0 {
                    return Err(Error::InvalidInput(
                        "initial condition batch must not be empty".into(),
                    ));
                }
                if let Some(v) = batch
                    .iter()
                    .find(|v| !v.is_finite() || **v < 0.0 || **v > TAU)
                {
                    return Err(Error::InvalidInput(format!(
                        "initial conditions must lie in [0, 2π], found {v}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of trajectories this variant produces.
    pub fn n_sim(&self) -> usize {
        match self {
            InitialConditions::Random(n) => *n,
            InitialConditions::Batch(batch) => batch.nrows(),
        }
    }

    /// Allocate a zeroed (n_sim, 2, n_iters) state and fill step 0.
    ///
    /// Random batches draw each trajectory's pair jointly, I first and then theta,
    /// from a `StdRng` seeded with `seed` (or a fresh seed when `None`).
    pub(crate) fn materialize(&self, n_iters: usize, seed: Option<u64>) -> Result<Array3<f64>> {
        self.validate()?;
        let mut state = Array3::<f64>::zeros((self.n_sim(), 2, n_iters));
        match self {
            InitialConditions::Random(_) => {
                let mut rng: StdRng = match seed {
                    Some(s) => SeedableRng::seed_from_u64(s),
                    None => SeedableRng::seed_from_u64(rng().random()),
                };
                for mut traj in state.outer_iter_mut() {
                    traj[[ACTION, 0]] = rng.random_range(0.0..TAU);
                    traj[[ANGLE, 0]] = rng.random_range(0.0..TAU);
                }
            }
            InitialConditions::Batch(batch) => {
                state.slice_mut(s![.., .., 0]).assign(batch);
            }
        }
        Ok(state)
    }
}

/// Dense trajectory state of shape (n_sim, 2, n_iters).
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    data: Array3<f64>,
}

impl Trajectory {
    pub(crate) fn from_state(data: Array3<f64>) -> Self {
        Self { data }
    }

    /// Number of trajectories in the batch.
    #[inline]
    pub fn n_sim(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Number of stored time steps.
    #[inline]
    pub fn n_iters(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Full state view, indexed as `[trajectory, component, step]`.
    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// (I, theta) of trajectory `sim` at `step`, or `None` when out of bounds.
    pub fn point(&self, sim: usize, step: usize) -> Option<(f64, f64)> {
        let i = *self.data.get([sim, ACTION, step])?;
        let theta = *self.data.get([sim, ANGLE, step])?;
        Some((i, theta))
    }

    /// Step-0 values as an (n_sim, 2) view.
    pub fn initial_conditions(&self) -> ArrayView2<'_, f64> {
        self.data.slice(s![.., .., 0])
    }

    /// Consume into the underlying array.
    pub fn into_array(self) -> Array3<f64> {
        self.data
    }
}
